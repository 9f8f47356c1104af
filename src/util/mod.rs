pub type Color = rgb::RGB<f32>;

pub const BLACK: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};
pub const WHITE: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

pub fn gray(v: f32) -> Color {
    Color::new(v, v, v)
}

/// Componentwise product, used for filtering light through a colored surface.
pub fn filter(a: Color, b: Color) -> Color {
    Color::new(a.r * b.r, a.g * b.g, a.b * b.b)
}

pub fn max_channel(c: Color) -> f32 {
    c.r.max(c.g).max(c.b)
}

pub fn is_finite(c: Color) -> bool {
    c.r.is_finite() && c.g.is_finite() && c.b.is_finite()
}

/// Scales the whole color down so that no channel exceeds `ceiling`.
/// Returns the input unchanged if it is already below.
pub fn clamp_to_ceiling(c: Color, ceiling: f32) -> Color {
    let max = max_channel(c);
    if max > ceiling { c * (ceiling / max) } else { c }
}

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed for the random stream of one row in one pass.
///
/// Seed, pass and row are mixed in one after another, so no two
/// `(seed, pass, row)` triples share a stream by simple arithmetic.
pub fn stream_seed(seed: u64, pass: u32, row: u32) -> u64 {
    let z = mix(seed.wrapping_add(GOLDEN_GAMMA));
    let z = mix(z.wrapping_add(GOLDEN_GAMMA) ^ pass as u64);
    mix(z.wrapping_add(GOLDEN_GAMMA) ^ row as u64)
}
