use grainfield::GrainEngine;

// -------------------------------------------------------------------------------------------------

/// Install a debug logger, once per test binary.
#[allow(unused)]
pub fn create_logger() {
    // other tests in the same binary may have installed it already
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// Render `block_count` blocks of `block_len` samples and return the concatenated output.
#[allow(unused)]
pub fn render_blocks(
    engine: &mut GrainEngine,
    block_count: usize,
    block_len: usize,
) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; block_count * block_len];
    let mut right = vec![0.0; block_count * block_len];
    for (left, right) in left
        .chunks_exact_mut(block_len)
        .zip(right.chunks_exact_mut(block_len))
    {
        engine.render(left, right);
    }
    (left, right)
}
