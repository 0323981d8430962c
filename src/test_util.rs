#[macro_export]
macro_rules! assert_approx_eq {
    ($expected:expr, $actual:expr) => {{
        $crate::assert_approx_eq!($expected, $actual, 1e-10)
    }};
    ($expected:expr, $actual:expr, $eps:expr) => {{
        let expected: f64 = $expected;
        let actual: f64 = $actual;
        assert!(
            (expected - actual).abs() < $eps,
            "Expected {}, but got {} (eps = {})",
            expected,
            actual,
            $eps
        );
    }};
}

#[macro_export]
macro_rules! assert_approx_complex_eq {
    ($expected_re:expr, $expected_im:expr, $actual:expr) => {{
        use num_complex::Complex;
        #[inline(always)]
        pub fn approx_eq(
            expected_re: f64,
            expected_im: f64,
            actual: Complex<f64>,
            eps: f64,
        ) -> bool {
            (expected_re - actual.re).abs() < eps && (expected_im - actual.im).abs() < eps
        }

        assert!(
            approx_eq($expected_re, $expected_im, $actual, 1e-10),
            "Expected {}+{}i,  but got {}",
            $expected_re,
            $expected_im,
            $actual
        );
    }};
}

/// Asserts that two qubit states carry the same amplitudes and angles.
#[macro_export]
macro_rules! assert_state_eq {
    ($expected:expr, $actual:expr) => {{
        let expected = &$expected;
        let actual = &$actual;
        $crate::assert_approx_eq!(expected.alpha(), actual.alpha(), 1e-9);
        $crate::assert_approx_eq!(expected.beta(), actual.beta(), 1e-9);
        $crate::assert_approx_eq!(expected.theta(), actual.theta(), 1e-6);
        $crate::assert_approx_eq!(expected.phi(), actual.phi(), 1e-6);
    }};
}
