//! Heading quantization: turns a magnetometer heading into the needle
//! direction that points at Magnetic North.

/// Number of needle directions on the reference display.
pub const DEFAULT_BUCKET_COUNT: u16 = 16;

/// Quantize `heading` (degrees, any real value) into one of `bucket_count`
/// equally spaced directions.
///
/// The result is the index, clockwise from straight ahead, of the direction
/// the node has to turn toward to face North. Buckets are centred on their
/// nominal angle: with 16 buckets, headings from just above 348.5° through
/// 11° all map to bucket 0.
///
/// The index is `floor((half - heading) / width) mod bucket_count`, where
/// `width = 360 / bucket_count` and `half` is `width / 2` truncated to whole
/// degrees. Because of the `floor`, a heading that lands exactly on a bucket
/// edge goes to the bucket covering the smaller headings: `quantize(11.0, 16)`
/// is 0 and `quantize(33.5, 16)` is 15.
///
/// Headings outside `[0, 360)` are wrapped first; non-finite input counts as
/// 0°. A `bucket_count` of 0 is treated as 1.
pub fn quantize(heading: f32, bucket_count: u16) -> u16 {
    let buckets = bucket_count.max(1);
    let width = 360.0 / f32::from(buckets);
    let half = truncate(width / 2.0);

    let raw = (half - normalize(heading)) / width;
    let index = floor(raw).rem_euclid(i32::from(buckets));

    // rem_euclid keeps us in [0, buckets)
    index as u16
}

/// Wrap a heading into `[0, 360)`.
pub fn normalize(heading: f32) -> f32 {
    if !heading.is_finite() {
        return 0.0;
    }
    let wrapped = heading % 360.0;
    let wrapped = if wrapped < 0.0 { wrapped + 360.0 } else { wrapped };
    // -0.000001 % 360 + 360 rounds to 360.0 in f32
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// Float helpers that stay inside `core`.

fn truncate(value: f32) -> f32 {
    value as i32 as f32
}

fn floor(value: f32) -> i32 {
    let whole = value as i32;
    if (whole as f32) > value {
        whole - 1
    } else {
        whole
    }
}
