//! Deterministic per-class display colors.

/// 8-bit RGB triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Creates a color from components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

const PALETTE: [Rgb; 20] = [
    Rgb::from_hex(0xFF3838),
    Rgb::from_hex(0xFF9D97),
    Rgb::from_hex(0xFF701F),
    Rgb::from_hex(0xFFB21D),
    Rgb::from_hex(0xCFD231),
    Rgb::from_hex(0x48F90A),
    Rgb::from_hex(0x92CC17),
    Rgb::from_hex(0x3DDB86),
    Rgb::from_hex(0x1A9334),
    Rgb::from_hex(0x00D4BB),
    Rgb::from_hex(0x2C99A8),
    Rgb::from_hex(0x00C2FF),
    Rgb::from_hex(0x344593),
    Rgb::from_hex(0x6473FF),
    Rgb::from_hex(0x0018EC),
    Rgb::from_hex(0x8438FF),
    Rgb::from_hex(0x520085),
    Rgb::from_hex(0xCB38FF),
    Rgb::from_hex(0xFF95C8),
    Rgb::from_hex(0xFF37C7),
];

/// Display color for a class; the palette repeats every 20 classes.
pub fn color_for_class(class_id: usize) -> Rgb {
    PALETTE[class_id % PALETTE.len()]
}
