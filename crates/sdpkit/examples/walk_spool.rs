use sdpkit::spool::{Direction, PictureData, Point, Rect, SpoolData, SpoolWriter};
use std::error::Error;
use std::io::Cursor;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut writer = SpoolWriter::new();
    for page in 0..3 {
        let pictures = (0..=page).map(|n| {
            PictureData::new(
                Point::new(10.0 * n as f32, 20.0),
                Rect::new(0.0, 0.0, 595.0, 842.0),
                format!("page {} picture {}", page, n),
            )
        });
        writer.add_page(pictures);
    }
    let bytes = writer.to_bytes()?;

    for direction in [Direction::Forward, Direction::Reverse] {
        println!("{:?}:", direction);
        let mut spool = SpoolData::open(Cursor::new(bytes.clone()), direction)?;
        spool.start_enum();
        while let Some(page) = spool.enum_object() {
            println!("  page {}", page.number());
            for picture in page.pictures() {
                println!("    {}", String::from_utf8_lossy(&picture.payload));
            }
        }
    }

    Ok(())
}
