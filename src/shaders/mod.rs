//! Embedded WGSL shaders

/// Textured quad shader used by [`crate::video::QuadRenderer`]
pub const VIDEO_QUAD_SHADER: &str = include_str!("video_quad.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_quad_entry_points() {
        assert!(VIDEO_QUAD_SHADER.contains("fn vs_main"));
        assert!(VIDEO_QUAD_SHADER.contains("fn fs_main"));
    }
}
