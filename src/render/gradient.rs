use crate::models::{Color, Gradient, GradientAxis, GradientKind};

/// Colour of the dark module at column `x`, row `y` in a symbol `size` modules wide.
///
/// The gradient position is taken at the module centre.
pub fn module_color(gradient: &Gradient, size: usize, x: usize, y: usize) -> Color {
    gradient.color_at(position(gradient.kind, size, x, y))
}

fn position(kind: GradientKind, size: usize, x: usize, y: usize) -> f32 {
    let side = size.max(1) as f32;
    let cx = x as f32 + 0.5;
    let cy = y as f32 + 0.5;
    match kind {
        GradientKind::Linear(GradientAxis::Horizontal) => cx / side,
        GradientKind::Linear(GradientAxis::Vertical) => cy / side,
        GradientKind::Linear(GradientAxis::Diagonal) => (cx + cy) / (2.0 * side),
        GradientKind::Radial => {
            let half = side / 2.0;
            let dx = cx - half;
            let dy = cy - half;
            (dx * dx + dy * dy).sqrt() / (half * std::f32::consts::SQRT_2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_endpoints() {
        let g = Gradient::two_stop(
            GradientKind::Linear(GradientAxis::Horizontal),
            Color::rgb(0, 0, 0),
            Color::rgb(200, 0, 0),
        );
        let left = module_color(&g, 21, 0, 10);
        let right = module_color(&g, 21, 20, 10);
        assert!(left.r < 10);
        assert!(right.r > 190);
        // Rows do not matter on the horizontal axis
        assert_eq!(module_color(&g, 21, 7, 0), module_color(&g, 21, 7, 20));
    }

    #[test]
    fn test_radial_centre_and_corner() {
        let g = Gradient::two_stop(GradientKind::Radial, Color::WHITE, Color::BLACK);
        let centre = module_color(&g, 21, 10, 10);
        let corner = module_color(&g, 21, 0, 0);
        assert!(centre.r > 240);
        assert!(corner.r < 20);
    }
}
