// MIT/Apache2 License

use gdiplus_compat::{
    image::{BitmapData, Dispatcher, ImageFormat, PixelFormat, ResourceLimits},
    Argb, Result,
};
use std::env;

fn main() -> Result {
    env_logger::init();

    let mut bitmap = BitmapData::new(64, 32, PixelFormat::Rgb24)?;
    for y in 0..32 {
        for x in 0..64 {
            bitmap.set_pixel(x, y, Argb::opaque((x * 4) as u8, (y * 8) as u8, 0x80))?;
        }
    }

    let path = env::temp_dir().join("gdiplus_compat_roundtrip.bmp");
    let dispatcher = Dispatcher::new()
        .with_limits(ResourceLimits::none().with_max_pixels(1 << 20))
        .retain_metadata(true);

    dispatcher.save_file(&bitmap, ImageFormat::Bmp, &path)?;
    println!("wrote {}", path.display());

    let loaded = dispatcher.load_file(&path)?;
    println!(
        "loaded {}x{} {:?} image, {} metadata bytes",
        loaded.width(),
        loaded.height(),
        loaded.pixel_format(),
        loaded.metadata.as_ref().map_or(0, |m| m.len())
    );
    println!("pixel (10, 20) = {:?}", loaded.pixel(10, 20));
    assert_eq!(loaded.scan0(), bitmap.scan0());

    std::fs::remove_file(&path)?;
    Ok(())
}
