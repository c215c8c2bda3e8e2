//! Common test fixtures for kcell tests.
//!
//! Coordinates are in the CAMx continental Lambert Conformal grid
//! (33°/45° parallels, -97° meridian, 40° origin), in meters.

/// Points of interest as (lat, lon).
pub mod poi {
    /// Projection origin
    pub const ORIGIN: (f64, f64) = (40.0, -97.0);

    /// Atlanta, GA
    pub const ATLANTA: (f64, f64) = (33.749, -84.388);

    /// Pittsburgh, PA
    pub const PITTSBURGH: (f64, f64) = (40.4406, -79.9959);
}

/// Reference-file lines for the target loader.
pub mod references {
    /// Two valid space-separated lines and one malformed line.
    pub const MIXED: [&str; 4] = [
        "# substation x y (m)",
        "1000.0000 2000.0000",
        "not a coordinate line",
        "-5000.5 2500.25",
    ];

    /// Comma-separated lines.
    pub const COMMA: [&str; 2] = ["1000.0,2000.0", "-5000.5,2500.25"];

    /// Lines that must always be rejected.
    pub const MALFORMED: [&str; 6] = [
        "",
        "1000 2000",
        "1000.0",
        "x.0 2.0",
        "1000.0\t2000.0",
        "1000.0  2000.0",
    ];
}
