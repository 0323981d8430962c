//! Renders the Bloch sphere after every step of a short circuit into PNG
//! files, driving the projector the way an interactive view would.

use std::ops::ControlFlow;

use anyhow::Result;
use bloch_sim::{BlochProjector, Config, Gate, QubitState, Session};
use plotters::prelude::*;

const CANVAS: (u32, u32) = (400, 400);

fn to_pixel(x: f64, y: f64) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn draw_state(projector: &BlochProjector, state: &QubitState, file_name: &str) -> Result<()> {
    let root = BitMapBackend::new(file_name, CANVAS).into_drawing_area();
    root.fill(&BLACK)?;

    let center = projector.center();
    let radius = projector.radius();

    root.draw(&Circle::new(
        to_pixel(center.x, center.y),
        radius as i32,
        CYAN.stroke_width(2),
    ))?;

    // Vertical (z) and horizontal (x) axes.
    root.draw(&PathElement::new(
        vec![
            to_pixel(center.x, center.y - radius),
            to_pixel(center.x, center.y + radius),
        ],
        WHITE.mix(0.4),
    ))?;
    root.draw(&PathElement::new(
        vec![
            to_pixel(center.x - radius, center.y),
            to_pixel(center.x + radius, center.y),
        ],
        WHITE.mix(0.4),
    ))?;

    let label_style = ("sans-serif", 18).into_font().color(&WHITE);
    root.draw(&Text::new(
        "|0⟩",
        to_pixel(center.x - 10.0, center.y - radius - 25.0),
        label_style.clone(),
    ))?;
    root.draw(&Text::new(
        "|1⟩",
        to_pixel(center.x - 10.0, center.y + radius + 8.0),
        label_style.clone(),
    ))?;

    let projection = projector.project_state(state);
    let tip = to_pixel(projection.screen.x, projection.screen.y);
    root.draw(&PathElement::new(
        vec![to_pixel(center.x, center.y), tip],
        RED.stroke_width(3),
    ))?;
    root.draw(&Circle::new(tip, 6, RED.filled()))?;

    root.draw(&Text::new(state.to_string(), (10, 10), label_style))?;

    root.present()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config {
        seed: Some(42),
        ..Config::default()
    };
    let mut session = Session::from_config(&config);
    for gate in [Gate::H, Gate::T, Gate::S, Gate::X] {
        session.append(gate);
    }

    let mut states = vec![QubitState::zero_state()];
    let status = session.play_all(|event| {
        states.push(event.state);
        ControlFlow::Continue(())
    });
    println!("{}", status);

    for (i, state) in states.iter().enumerate() {
        let file_name = format!("bloch_step_{}.png", i);
        draw_state(session.projector(), state, &file_name)?;
        println!("{} -> {}", state, file_name);
    }

    Ok(())
}
