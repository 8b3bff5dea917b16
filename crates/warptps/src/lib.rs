#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use warptps_image as image;

#[doc(inline)]
pub use warptps_imgproc as imgproc;

#[doc(inline)]
pub use warptps_tps as tps;

/// Version of the library, usable as a capability probe.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_matches_package() {
        assert_eq!(super::version(), "0.1.0");
        assert!(!super::version().is_empty());
    }
}
