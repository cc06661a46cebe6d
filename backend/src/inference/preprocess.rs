use super::error::DecodeError;
use crate::config::ImageConfig;
use image::ImageFormat;
use ndarray::Array4;
use std::path::Path;

/// An image as received from the upload form. Lives for one request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    /// Bytes seen on the wire; larger than `bytes.len()` when the upload was cut off at the limit.
    pub received_size: usize,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        let received_size = bytes.len();
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
            received_size,
        }
    }

    /// Format claimed by the file name, falling back to the content type.
    pub fn declared_format(&self) -> Option<ImageFormat> {
        let from_extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .and_then(|ext| match ext.as_str() {
                "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
                "png" => Some(ImageFormat::Png),
                _ => None,
            });

        from_extension.or_else(|| match self.content_type.as_deref() {
            Some("image/jpeg") | Some("image/jpg") => Some(ImageFormat::Jpeg),
            Some("image/png") => Some(ImageFormat::Png),
            _ => None,
        })
    }

    pub fn data_uri(&self, format: ImageFormat) -> String {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Checks size and declared format before any decoding work is done.
pub fn validate_upload(upload: &UploadedImage, max_bytes: usize) -> Result<(), DecodeError> {
    if upload.received_size == 0 {
        return Err(DecodeError::Empty);
    }
    if upload.received_size > max_bytes {
        return Err(DecodeError::TooLarge {
            size: upload.received_size,
            limit: max_bytes,
        });
    }
    upload
        .declared_format()
        .map(|_| ())
        .ok_or(DecodeError::UnsupportedFormat)
}

/// Sniffs the real container format from the bytes. Only PNG and JPEG pass.
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, DecodeError> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg)) => Ok(format),
        _ => Err(DecodeError::UnsupportedFormat),
    }
}

/// Decodes `bytes` into a `(1, height, width, 3)` tensor with values in `[0, 1]`.
///
/// The image is stretched to the configured size; aspect ratio is not kept.
pub fn preprocess(bytes: &[u8], config: &ImageConfig) -> Result<Array4<f32>, DecodeError> {
    let format = detect_format(bytes)?;
    let img = image::load_from_memory_with_format(bytes, format)?;

    let resized = img.resize_exact(
        config.width(),
        config.height(),
        config.preprocessing.resize_method.filter(),
    );
    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let tensor = Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| f32::from(rgb.get_pixel(x as u32, y as u32)[c]) / 255.0,
    );
    Ok(tensor)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ResizeMethod;
    use image::{DynamicImage, GrayImage, RgbImage};
    use std::io::Cursor;

    pub(crate) fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    pub(crate) fn gradient_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 255])
        });
        encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
    }

    fn assert_valid_tensor(tensor: &Array4<f32>) {
        assert_eq!(tensor.shape(), &[1, 350, 350, 3]);
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn any_resolution_becomes_fixed_shape() {
        let config = ImageConfig::default();
        for (w, h) in [(1, 1), (64, 480), (350, 350), (1024, 700)] {
            let tensor = preprocess(&gradient_png(w, h), &config).unwrap();
            assert_valid_tensor(&tensor);
        }
    }

    #[test]
    fn jpeg_and_grayscale_inputs_are_accepted() {
        let config = ImageConfig::default();

        let rgb = RgbImage::from_pixel(40, 30, image::Rgb([10, 20, 30]));
        let jpeg = encode(DynamicImage::ImageRgb8(rgb), ImageFormat::Jpeg);
        assert_valid_tensor(&preprocess(&jpeg, &config).unwrap());

        let gray = GrayImage::from_pixel(50, 50, image::Luma([128]));
        let tensor = preprocess(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png), &config)
            .unwrap();
        assert_valid_tensor(&tensor);
        assert!((tensor[[0, 10, 10, 0]] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 10, 10, 0]], tensor[[0, 10, 10, 2]]);
    }

    #[test]
    fn values_are_scaled_by_255() {
        let img = RgbImage::from_pixel(350, 350, image::Rgb([0, 255, 51]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);
        let tensor = preprocess(&bytes, &ImageConfig::default()).unwrap();
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert_eq!(tensor[[0, 349, 349, 1]], 1.0);
        assert!((tensor[[0, 100, 200, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn honours_configured_size_and_filter() {
        let mut config = ImageConfig::default();
        config.size = [32, 64];
        config.preprocessing.resize_method = ResizeMethod::Triangle;
        let tensor = preprocess(&gradient_png(100, 100), &config).unwrap();
        assert_eq!(tensor.shape(), &[1, 32, 64, 3]);
    }

    #[test]
    fn text_renamed_to_png_is_a_decode_error() {
        let upload = UploadedImage::new("notes.png", None, b"just some text".to_vec());
        assert!(validate_upload(&upload, 1024).is_ok());
        let err = preprocess(&upload.bytes, &ImageConfig::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let mut bytes = gradient_png(20, 20);
        bytes.truncate(40);
        let err = preprocess(&bytes, &ImageConfig::default()).unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn bmp_is_rejected_even_when_valid() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]));
        let bmp = encode(DynamicImage::ImageRgb8(img), ImageFormat::Bmp);
        let err = preprocess(&bmp, &ImageConfig::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedFormat));
    }

    #[test]
    fn declared_format_uses_extension_then_content_type() {
        let upload = UploadedImage::new("SCAN.JPEG", None, vec![1]);
        assert_eq!(upload.declared_format(), Some(ImageFormat::Jpeg));

        let upload = UploadedImage::new("blob", Some("image/png".into()), vec![1]);
        assert_eq!(upload.declared_format(), Some(ImageFormat::Png));

        let upload = UploadedImage::new("scan.bmp", Some("image/bmp".into()), vec![1]);
        assert_eq!(upload.declared_format(), None);
        assert!(matches!(
            validate_upload(&upload, 1024),
            Err(DecodeError::UnsupportedFormat)
        ));
    }

    #[test]
    fn upload_limits_are_enforced() {
        let upload = UploadedImage::new("scan.png", None, Vec::new());
        assert!(matches!(validate_upload(&upload, 10), Err(DecodeError::Empty)));

        let upload = UploadedImage::new("scan.png", None, vec![0; 11]);
        assert!(matches!(
            validate_upload(&upload, 10),
            Err(DecodeError::TooLarge { size: 11, limit: 10 })
        ));
    }

    #[test]
    fn data_uri_carries_mime_type() {
        let upload = UploadedImage::new("scan.png", None, vec![1, 2, 3]);
        assert_eq!(upload.data_uri(ImageFormat::Png), "data:image/png;base64,AQID");
    }
}
