// MIT/Apache2 License

use gdiplus_compat::{
    Argb, ColorStop, Extend, LinearGradient, LinearGradientMode, Pattern, Point, Rect, Result, Size,
    Surface, WrapMode,
};
use lyon_geom::Transform;

/// Prints every pattern call instead of painting.
struct PrintSurface;

struct PrintPattern;

impl Pattern for PrintPattern {
    fn add_color_stop(&mut self, stop: ColorStop) {
        let (r, g, b, a) = stop.color.clamp_u8();
        println!(
            "  stop {:>8.4}: #{:02x}{:02x}{:02x}{:02x}",
            stop.offset, a, r, g, b
        );
    }

    fn set_extend(&mut self, extend: Extend) {
        println!("  extend {:?}", extend);
    }

    fn set_matrix(&mut self, matrix: &Transform<f32>) {
        println!("  matrix {:?}", matrix.to_array());
    }
}

impl Surface for PrintSurface {
    type Pattern = PrintPattern;

    fn create_linear_pattern(&mut self, start: Point<f32>, end: Point<f32>) -> Result<PrintPattern> {
        println!("linear pattern from {:?} to {:?}", start, end);
        Ok(PrintPattern)
    }

    fn set_source(&mut self, _pattern: PrintPattern) -> Result {
        println!("source set");
        Ok(())
    }
}

fn main() -> Result {
    env_logger::init();

    let rect = Rect::new(Point::new(0.0, 0.0), Size::new(200.0, 100.0));
    let mut brush = LinearGradient::from_rect(
        rect,
        Argb(0xFFFF_0000),
        Argb(0xFF00_00FF),
        LinearGradientMode::ForwardDiagonal,
        WrapMode::TileFlipX,
    )?;
    brush.realize(&mut PrintSurface)?;

    brush.set_linear_blend(0.25, 1.0)?;
    brush.realize(&mut PrintSurface)?;

    brush.set_sigma_blend(0.5, 1.0)?;
    let stops = brush.stops();
    println!("sigma blend produced {} stops", stops.len());
    for stop in stops.iter().step_by(64) {
        println!("  {:.4} -> {:?}", stop.offset, Argb::from(stop.color));
    }

    Ok(())
}
