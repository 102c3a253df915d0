// Public API tests on a 5x5 fixture where pixel i (row-major) is (i, 0, 0, 255).
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use image_to_colors::{
    Color, ColorExtractor, ColorSource, CuttingParameters, ExtractionError, ExtractionParameters,
    ExtractorConfig,
};
use proptest::prelude::*;
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;

const SIDE: u32 = 5;

fn fixture_surface() -> RgbaImage {
    ImageBuffer::from_fn(SIDE, SIDE, |x, y| Rgba([(y * SIDE + x) as u8, 0, 0, 255]))
}

fn fixture_png() -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(fixture_surface())
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode fixture");
    cursor.into_inner()
}

fn fixture_data_url() -> String {
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(fixture_png()))
}

/// 在回环地址上应答一次 PNG，返回端口与服务线程。
fn serve_png_once(body: Vec<u8>) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let port = listener.local_addr().expect("read local addr failed").port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let mut req_buf = [0u8; 4096];
        let _ = stream.read(&mut req_buf);

        let headers = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(headers.as_bytes()).expect("write headers failed");
        stream.write_all(&body).expect("write body failed");
        stream.flush().expect("flush failed");
    });

    (port, server)
}

fn reds(values: impl IntoIterator<Item = u8>) -> Vec<Color> {
    values.into_iter().map(|r| Color(r, 0, 0)).collect()
}

fn center_block() -> Vec<Color> {
    reds([6, 7, 8, 11, 12, 13, 16, 17, 18])
}

mod extract_all {
    use super::*;

    #[test]
    fn from_loaded_surface() {
        let colors = image_to_colors::get(&fixture_surface(), None).expect("extraction failed");
        assert_eq!(colors, reds(0..25));
    }

    #[test]
    fn from_decoded_image() {
        let image = DynamicImage::ImageRgba8(fixture_surface());
        let colors = image_to_colors::get(&image, None).expect("extraction failed");
        assert_eq!(colors, reds(0..25));
    }

    #[tokio::test]
    async fn from_external_source() {
        let colors = image_to_colors::get_from_external_source(&fixture_data_url(), None)
            .await
            .expect("extraction failed");
        assert_eq!(colors, reds(0..25));
    }

    #[tokio::test]
    async fn from_external_source_anonymously() {
        let params = ExtractionParameters::default().with_cross_origin_anonymous(true);
        let colors = image_to_colors::get_from_external_source(&fixture_data_url(), Some(&params))
            .await
            .expect("extraction failed");
        assert_eq!(colors, reds(0..25));
    }

    #[tokio::test]
    async fn from_local_file() {
        let path = std::env::temp_dir().join(format!("image-to-colors-it-{}.png", std::process::id()));
        std::fs::write(&path, fixture_png()).expect("write fixture failed");

        let result = image_to_colors::get_from_external_source(&path.to_string_lossy(), None).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(result.expect("extraction failed"), reds(0..25));
    }

    #[tokio::test]
    async fn from_loopback_url() {
        let (port, server) = serve_png_once(fixture_png());
        let url = format!("http://127.0.0.1:{}/fixture.png", port);

        let colors = image_to_colors::get_from_external_source(&url, None)
            .await
            .expect("extraction failed");

        server.join().expect("server thread failed");
        assert_eq!(colors, reds(0..25));
    }

    #[tokio::test]
    async fn from_less_detailed_image() {
        let params = ExtractionParameters::default().with_detailing_percentage(40.0);
        let colors = image_to_colors::get_from_external_source(&fixture_data_url(), Some(&params))
            .await
            .expect("extraction failed");

        assert_eq!(colors.len(), 4);
        assert!(colors.iter().all(|c| c.green() == 0 && c.blue() == 0));
    }
}

mod extract_first_unit {
    use super::*;

    #[test]
    fn using_pixels() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::pixels(0.0, 0.0, 1.0, 1.0));
        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        assert_eq!(colors, vec![Color(0, 0, 0)]);
    }

    #[test]
    fn using_percentage() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::percentage(0.0, 0.0, 20.0, 20.0));
        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        assert_eq!(colors, vec![Color(0, 0, 0)]);
    }
}

mod extract_center_square {
    use super::*;

    #[test]
    fn using_pixels() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::pixels(1.0, 1.0, 3.0, 3.0));
        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        assert_eq!(colors, center_block());
    }

    #[test]
    fn using_percentage() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::percentage(20.0, 20.0, 60.0, 60.0));
        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        assert_eq!(colors, center_block());
    }

    #[test]
    fn using_negative_extents_from_bottom_right() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::pixels(4.0, 4.0, -3.0, -3.0));
        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        assert_eq!(colors, center_block());
    }

    #[tokio::test]
    async fn using_percentage_from_external_source() {
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::percentage(20.0, 20.0, 60.0, 60.0));
        let colors = image_to_colors::get_from_external_source(&fixture_data_url(), Some(&params))
            .await
            .expect("extraction failed");
        assert_eq!(colors, center_block());
    }
}

#[test]
fn out_of_range_cut_fails_instead_of_clamping() {
    let params = ExtractionParameters::default()
        .with_cutting(CuttingParameters::percentage(50.0, 50.0, 60.0, 60.0));
    let result = image_to_colors::get(&fixture_surface(), Some(&params));

    assert!(matches!(result, Err(ExtractionError::OutOfRange { surface: (5, 5), .. })));
}

#[test]
fn zero_area_cut_yields_empty_list() {
    let params = ExtractionParameters::default()
        .with_cutting(CuttingParameters::pixels(2.0, 2.0, 0.0, 2.0));
    let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");

    assert!(colors.is_empty());
}

#[test]
fn detailing_reduces_sample_count_quadratically() {
    let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(10, 10, Rgba([9, 8, 7, 255])));
    let extractor = ColorExtractor::new(ExtractorConfig::default()).expect("extractor init failed");

    let full = extractor
        .get(ColorSource::Image(&image), None)
        .expect("extraction failed");
    let half = extractor
        .get(
            ColorSource::Image(&image),
            Some(&ExtractionParameters::default().with_detailing_percentage(50.0)),
        )
        .expect("extraction failed");

    assert_eq!(full.len(), 100);
    assert_eq!(half.len(), 25);
}

#[test]
fn extraction_is_idempotent() {
    let surface = fixture_surface();
    let params = ExtractionParameters::default()
        .with_cutting(CuttingParameters::pixels(1.0, 0.0, 3.0, 4.0));

    let first = image_to_colors::get(&surface, Some(&params)).expect("extraction failed");
    let second = image_to_colors::get(&surface, Some(&params)).expect("extraction failed");

    assert_eq!(first, second);
    assert_eq!(surface, fixture_surface());
}

#[tokio::test]
async fn unreadable_source_is_a_load_failure() {
    let missing = std::env::temp_dir().join("image-to-colors-missing-fixture.png");
    let err = image_to_colors::get_from_external_source(&missing.to_string_lossy(), None)
        .await
        .expect_err("missing file must fail");

    assert!(err.is_load_failure());
    assert!(matches!(err, ExtractionError::FileSystem(_)));
}

proptest! {
    #[test]
    fn any_pixel_keeps_rgb_and_drops_alpha(r: u8, g: u8, b: u8, a: u8) {
        let surface: RgbaImage = ImageBuffer::from_pixel(3, 2, Rgba([r, g, b, a]));
        let colors = image_to_colors::get(&surface, None).expect("extraction failed");

        prop_assert_eq!(colors.len(), 6);
        prop_assert!(colors.iter().all(|c| *c == Color(r, g, b)));
    }

    #[test]
    fn in_bounds_cut_returns_width_times_height_colors(
        x in 0u32..5,
        y in 0u32..5,
        w in 1u32..=5,
        h in 1u32..=5,
    ) {
        prop_assume!(x + w <= SIDE && y + h <= SIDE);
        let params = ExtractionParameters::default()
            .with_cutting(CuttingParameters::pixels(x.into(), y.into(), w.into(), h.into()));

        let colors = image_to_colors::get(&fixture_surface(), Some(&params)).expect("extraction failed");
        let expected: Vec<Color> = (y..y + h)
            .flat_map(|row| (x..x + w).map(move |col| Color((row * SIDE + col) as u8, 0, 0)))
            .collect();

        prop_assert_eq!(colors, expected);
    }

    #[test]
    fn percentage_cut_matches_equivalent_pixel_cut(
        x in 0u32..5,
        y in 0u32..5,
        w in 1u32..=5,
        h in 1u32..=5,
    ) {
        prop_assume!(x + w <= SIDE && y + h <= SIDE);
        let to_pct = |v: u32| f64::from(v * 20);
        let pixel = ExtractionParameters::default()
            .with_cutting(CuttingParameters::pixels(x.into(), y.into(), w.into(), h.into()));
        let percent = ExtractionParameters::default()
            .with_cutting(CuttingParameters::percentage(to_pct(x), to_pct(y), to_pct(w), to_pct(h)));

        let surface = fixture_surface();
        prop_assert_eq!(
            image_to_colors::get(&surface, Some(&pixel)).expect("pixel extraction failed"),
            image_to_colors::get(&surface, Some(&percent)).expect("percentage extraction failed")
        );
    }
}
