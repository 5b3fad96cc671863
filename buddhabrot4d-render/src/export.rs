//! PNG export with the render configuration embedded as tEXt chunks.

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use buddhabrot4d_core::BuddhabrotConfig;

use crate::buffer::RenderBuffer;

/// Write `buffer` as an RGBA PNG, tagging it with the parameters that
/// produced it.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    config: &BuddhabrotConfig,
) -> crate::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "buddhabrot4d".to_string())?;
    encoder.add_text_chunk("Description".to_string(), describe(config))?;
    for (key, value) in metadata_pairs(config) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.pixels)?;

    debug!(
        width = buffer.width,
        height = buffer.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

fn describe(cfg: &BuddhabrotConfig) -> String {
    format!(
        "4D Buddhabrot - volumes [{}] -> [{}], blend {:?}, lat {:.4}, lon {:.4}, RGB limits {}/{}/{}",
        cfg.volume_a,
        cfg.volume_b,
        cfg.blend.0,
        cfg.latitude,
        cfg.longitude,
        cfg.thresholds.red,
        cfg.thresholds.green,
        cfg.thresholds.blue,
    )
}

fn metadata_pairs(cfg: &BuddhabrotConfig) -> Vec<(String, String)> {
    vec![
        ("Buddhabrot4D.VolumeA".into(), cfg.volume_a.to_string()),
        ("Buddhabrot4D.VolumeB".into(), cfg.volume_b.to_string()),
        (
            "Buddhabrot4D.Blend".into(),
            format!("{},{},{}", cfg.blend.0[0], cfg.blend.0[1], cfg.blend.0[2]),
        ),
        ("Buddhabrot4D.Latitude".into(), cfg.latitude.to_string()),
        ("Buddhabrot4D.Longitude".into(), cfg.longitude.to_string()),
        ("Buddhabrot4D.MaxNRed".into(), cfg.thresholds.red.to_string()),
        ("Buddhabrot4D.MaxNGreen".into(), cfg.thresholds.green.to_string()),
        ("Buddhabrot4D.MaxNBlue".into(), cfg.thresholds.blue.to_string()),
        ("Buddhabrot4D.BoundaryCap".into(), cfg.boundary_cap.to_string()),
        ("Buddhabrot4D.MinEscape".into(), cfg.min_escape.to_string()),
        (
            "Buddhabrot4D.Oversampling".into(),
            cfg.effective_oversampling().to_string(),
        ),
        ("Buddhabrot4D.Brightness".into(), cfg.brightness.to_string()),
        ("Buddhabrot4D.ColorCap".into(), cfg.color_cap.to_string()),
        (
            "Buddhabrot4D.Resolution".into(),
            format!("{}x{}", cfg.width, cfg.height),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn export_creates_valid_png() {
        let buffer = RenderBuffer::new(4, 4);
        let dir = std::env::temp_dir().join("buddhabrot4d_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_export.png");
        export_png(&buffer, &path, &BuddhabrotConfig::for_canvas(4, 4))
            .expect("export should succeed");

        let mut file = std::fs::File::open(&path).expect("file should exist");
        let mut header = [0u8; 8];
        file.read_exact(&mut header).expect("should read header");
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_embeds_configuration() {
        let buffer = RenderBuffer::new(2, 2);
        let mut cfg = BuddhabrotConfig::for_canvas(2, 2);
        cfg.thresholds.green = 321;
        let dir = std::env::temp_dir().join("buddhabrot4d_test_export_meta");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_meta.png");
        export_png(&buffer, &path, &cfg).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let texts = &reader.info().uncompressed_latin1_text;
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Software" && t.text == "buddhabrot4d"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Buddhabrot4D.MaxNGreen" && t.text == "321"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Buddhabrot4D.VolumeA" && t.text == "zr,zi,cr"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let buffer = RenderBuffer::new(1, 1);
        let path = std::env::temp_dir()
            .join("buddhabrot4d_no_such_dir")
            .join("nested")
            .join("out.png");
        let err = export_png(&buffer, &path, &BuddhabrotConfig::default()).unwrap_err();
        assert!(matches!(err, crate::RenderError::Io(_)));
    }
}
