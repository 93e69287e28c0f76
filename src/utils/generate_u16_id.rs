use rand::Rng;

/// Draws a correlation id uniformly from the full `u16` range.
///
/// Ids are not checked against the ids currently in flight. With many
/// concurrent requests two of them can share an id; see
/// [`crate::dispatch::FrameCorrelator`] for what happens then.
#[inline]
pub fn generate_u16_id() -> u16 {
    rand::rng().random::<u16>()
}
