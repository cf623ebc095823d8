use std::fs;
use std::path::PathBuf;

use image::{DynamicImage, Rgba, RgbaImage};
use memegen::model::{Style, TextColor, TextLine, TextLineId};
use memegen::rendering::render;

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

const BACKGROUND: [u8; 4] = [30, 60, 90, 255];

/// A flat background stretches to exactly the same color, so every pixel of
/// the output is fixed by the text layout alone.
fn fixture_background() -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(300, 300, Rgba(BACKGROUND)))
}

#[test]
fn golden_meme_matches_fixture() {
    let lines = vec![
        TextLine::at(TextLineId(1), 20, 50).with_text("ONE DOES NOT SIMPLY"),
        TextLine::at(TextLineId(2), 80, 50).with_text("WRITE A GOLDEN TEST"),
        TextLine::at(TextLineId(3), 50, 25).with_text(""),
        TextLine::at(TextLineId(4), 50, 50).with_text("MIDDLE"),
        TextLine::at(TextLineId(5), 50, 75).with_text("ok"),
    ];
    let style = Style {
        font_size: 32,
        text_color: "#fc0".parse::<TextColor>().expect("color"),
        ..Style::default()
    };

    let raster = render(&fixture_background(), &lines, &style);

    // 19 glyphs of 19px advance centred on 250: pen at 70, first cell x 72..88,
    // rows 78..100 above the baseline at y = 100
    assert_eq!(raster.pixel(72, 99), Some([255, 204, 0, 255]));
    assert_eq!(raster.pixel(72, 77), Some([0, 0, 0, 255]));
    assert_eq!(raster.pixel(71, 99), Some([0, 0, 0, 255]));
    assert_eq!(raster.pixel(0, 0), Some(BACKGROUND));

    let digest = raster.fingerprint();
    let expected_path = golden_path("meme_basic.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, format!("{}\n", digest)).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let exp = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(hex::decode(exp.trim()).expect("invalid hex in golden").len(), 32);
    assert_eq!(digest, exp.trim());
}
