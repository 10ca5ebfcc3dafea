// core/src/validation.rs

//! Validation of create/update payloads. Pure: no I/O, no clock.

use crate::model::{ImageUpload, ProductFields, ProductPayload};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const TITLE_MAX_CHARS: usize = 20;
pub const DESCRIPTION_MAX_CHARS: usize = 255;
pub const DEFAULT_MAX_IMAGE_KB: u64 = 2048;

/// How much of the file is inspected when looking for an SVG root element.
const SVG_SNIFF_WINDOW: usize = 8 * 1024;

const MSG_TITLE_REQUIRED: &str = "El título es obligatorio.";
const MSG_TITLE_MAX: &str = "El título no debe superar los 20 caracteres.";
const MSG_DESCRIPTION_REQUIRED: &str = "La descripción es obligatoria.";
const MSG_DESCRIPTION_MAX: &str = "La descripción no debe superar los 255 caracteres.";
const MSG_PRICE_REQUIRED: &str = "El precio es obligatorio.";
const MSG_PRICE_NUMERIC: &str = "El precio debe ser un número.";
const MSG_IMAGE_REQUIRED: &str = "La imagen es obligatoria.";
const MSG_IMAGE_NOT_IMAGE: &str = "El archivo debe ser una imagen.";
const MSG_IMAGE_MIMES: &str = "La imagen debe tener uno de los siguientes formatos: jpeg, png, jpg, gif, svg.";

/// Whether an update must carry a new image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePolicy {
  /// Every update resupplies all four fields, image included.
  #[default]
  RequireOnUpdate,
  /// An update without an image keeps the current one.
  KeepExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
  Create,
  Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
  pub max_image_kb: u64,
  pub image_policy: ImagePolicy,
}

impl Default for ValidationRules {
  fn default() -> Self {
    Self {
      max_image_kb: DEFAULT_MAX_IMAGE_KB,
      image_policy: ImagePolicy::default(),
    }
  }
}

impl ValidationRules {
  fn image_required(&self, mode: ValidationMode) -> bool {
    match mode {
      ValidationMode::Create => true,
      ValidationMode::Update => self.image_policy == ImagePolicy::RequireOnUpdate,
    }
  }
}

/// Image types recognised from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
  Jpeg,
  Png,
  Gif,
  Svg,
  Bmp,
  Webp,
}

impl ImageFormat {
  pub fn mime(&self) -> &'static str {
    match self {
      ImageFormat::Jpeg => "image/jpeg",
      ImageFormat::Png => "image/png",
      ImageFormat::Gif => "image/gif",
      ImageFormat::Svg => "image/svg+xml",
      ImageFormat::Bmp => "image/bmp",
      ImageFormat::Webp => "image/webp",
    }
  }

  /// jpeg, png, gif and svg are accepted; other images are rejected by format.
  pub fn is_accepted(&self) -> bool {
    matches!(self, ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::Svg)
  }

  /// Identifies the image type from magic bytes, or an SVG root element
  /// near the top of a text file.
  pub fn sniff(bytes: &[u8]) -> Option<Self> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
      return Some(ImageFormat::Jpeg);
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
      return Some(ImageFormat::Png);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
      return Some(ImageFormat::Gif);
    }
    if bytes.starts_with(b"BM") && bytes.len() >= 18 {
      // The DIB header that follows the 14-byte file header announces its own size.
      let dib_size = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
      if matches!(dib_size, 12 | 40 | 52 | 56 | 64 | 108 | 124) {
        return Some(ImageFormat::Bmp);
      }
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
      return Some(ImageFormat::Webp);
    }
    let head = &bytes[..bytes.len().min(SVG_SNIFF_WINDOW)];
    let text = match std::str::from_utf8(head) {
      Ok(text) => text,
      // A character cut by the window end; anything else is not text.
      Err(e) if e.error_len().is_none() => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
      Err(_) => return None,
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let looks_like_markup = text.starts_with('<');
    (looks_like_markup && text.to_ascii_lowercase().contains("<svg")).then_some(ImageFormat::Svg)
  }
}

/// An image that passed validation, with its sniffed format.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
  pub upload: ImageUpload,
  pub format: ImageFormat,
}

/// The normalized result of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedProduct {
  pub fields: ProductFields,
  /// `None` only on an update under `ImagePolicy::KeepExisting`.
  pub image: Option<ValidatedImage>,
}

/// Field name → messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn field(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn has(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }

  pub fn fields(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{}: {}", field, message)?;
        first = false;
      }
    }
    Ok(())
  }
}

/// Validates `payload` for `mode` under `rules`.
pub fn validate(
  payload: &ProductPayload,
  mode: ValidationMode,
  rules: &ValidationRules,
) -> Result<ValidatedProduct, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  let title = required_text(&payload.title, "title", MSG_TITLE_REQUIRED, TITLE_MAX_CHARS, MSG_TITLE_MAX, &mut errors);
  let description = required_text(
    &payload.description,
    "description",
    MSG_DESCRIPTION_REQUIRED,
    DESCRIPTION_MAX_CHARS,
    MSG_DESCRIPTION_MAX,
    &mut errors,
  );
  let price = required_price(&payload.price, &mut errors);
  let image = image(payload.image.as_ref(), rules.image_required(mode), rules.max_image_kb, &mut errors);

  match (title, description, price) {
    (Some(title), Some(description), Some(price)) if errors.is_empty() => Ok(ValidatedProduct {
      fields: ProductFields {
        title,
        description,
        price,
      },
      image,
    }),
    _ => Err(errors),
  }
}

fn required_text(
  value: &Option<String>,
  field: &str,
  missing_msg: &str,
  max_chars: usize,
  max_msg: &str,
  errors: &mut ValidationErrors,
) -> Option<String> {
  let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
  if trimmed.is_empty() {
    errors.add(field, missing_msg);
    return None;
  }
  if trimmed.chars().count() > max_chars {
    errors.add(field, max_msg);
    return None;
  }
  Some(trimmed.to_string())
}

fn required_price(value: &Option<String>, errors: &mut ValidationErrors) -> Option<f64> {
  let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
  if trimmed.is_empty() {
    errors.add("price", MSG_PRICE_REQUIRED);
    return None;
  }
  match trimmed.parse::<f64>() {
    Ok(price) if price.is_finite() => Some(price),
    _ => {
      errors.add("price", MSG_PRICE_NUMERIC);
      None
    }
  }
}

fn image(
  upload: Option<&ImageUpload>,
  required: bool,
  max_image_kb: u64,
  errors: &mut ValidationErrors,
) -> Option<ValidatedImage> {
  // An empty file part is what a form sends when no file was chosen.
  let upload = match upload.filter(|u| u.size > 0) {
    Some(upload) => upload,
    None => {
      if required {
        errors.add("image", MSG_IMAGE_REQUIRED);
      }
      return None;
    }
  };

  let format = ImageFormat::sniff(&upload.bytes);
  let mut valid = true;
  match format {
    None => {
      errors.add("image", MSG_IMAGE_NOT_IMAGE);
      errors.add("image", MSG_IMAGE_MIMES);
      valid = false;
    }
    Some(format) if !format.is_accepted() => {
      errors.add("image", MSG_IMAGE_MIMES);
      valid = false;
    }
    Some(_) => {}
  }
  if upload.size > max_image_kb * 1024 {
    errors.add("image", image_max_message(max_image_kb));
    valid = false;
  }

  match (valid, format) {
    (true, Some(format)) => Some(ValidatedImage {
      upload: upload.clone(),
      format,
    }),
    _ => None,
  }
}

fn image_max_message(max_image_kb: u64) -> String {
  if max_image_kb % 1024 == 0 {
    format!("La imagen no debe exceder los {}MB.", max_image_kb / 1024)
  } else {
    format!("La imagen no debe exceder los {max_image_kb}KB.")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bytes::Bytes;

  const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

  fn payload(title: &str, description: &str, price: &str, image: Option<ImageUpload>) -> ProductPayload {
    ProductPayload {
      title: Some(title.to_string()),
      description: Some(description.to_string()),
      price: Some(price.to_string()),
      image,
    }
  }

  fn jpeg() -> Option<ImageUpload> {
    Some(ImageUpload::new("chair.jpg", Bytes::from_static(JPEG)))
  }

  #[test]
  fn accepts_a_complete_payload_and_trims_text() {
    let validated = validate(
      &payload("  Chair ", "Wooden chair", " 49.99 ", jpeg()),
      ValidationMode::Create,
      &ValidationRules::default(),
    )
    .unwrap();

    assert_eq!(validated.fields.title, "Chair");
    assert_eq!(validated.fields.price, 49.99);
    assert_eq!(validated.image.unwrap().format, ImageFormat::Jpeg);
  }

  #[test]
  fn title_limit_counts_characters_not_bytes() {
    let twenty_accented = "é".repeat(20);
    assert!(validate(
      &payload(&twenty_accented, "d", "1", jpeg()),
      ValidationMode::Create,
      &ValidationRules::default()
    )
    .is_ok());

    let errors = validate(
      &payload(&"a".repeat(21), "d", "1", jpeg()),
      ValidationMode::Create,
      &ValidationRules::default(),
    )
    .unwrap_err();
    assert_eq!(errors.field("title"), [MSG_TITLE_MAX]);
  }

  #[test]
  fn reports_every_missing_field_at_once() {
    let errors = validate(&ProductPayload::default(), ValidationMode::Create, &ValidationRules::default()).unwrap_err();

    assert_eq!(errors.field("title"), [MSG_TITLE_REQUIRED]);
    assert_eq!(errors.field("description"), [MSG_DESCRIPTION_REQUIRED]);
    assert_eq!(errors.field("price"), [MSG_PRICE_REQUIRED]);
    assert_eq!(errors.field("image"), [MSG_IMAGE_REQUIRED]);
  }

  #[test]
  fn price_accepts_any_finite_number() {
    for ok in ["-3", "0", "1e3", ".5", "+7.25"] {
      assert!(
        validate(&payload("t", "d", ok, jpeg()), ValidationMode::Create, &ValidationRules::default()).is_ok(),
        "{ok} should be accepted"
      );
    }
    for bad in ["abc", "12,5", "NaN", "inf"] {
      let errors =
        validate(&payload("t", "d", bad, jpeg()), ValidationMode::Create, &ValidationRules::default()).unwrap_err();
      assert_eq!(errors.field("price"), [MSG_PRICE_NUMERIC], "{bad} should be rejected");
    }
  }

  #[test]
  fn text_file_is_not_an_image() {
    let text = ImageUpload::new("notes.jpg", Bytes::from_static(b"just some notes"));
    let errors =
      validate(&payload("t", "d", "1", Some(text)), ValidationMode::Create, &ValidationRules::default()).unwrap_err();

    assert_eq!(errors.field("image"), [MSG_IMAGE_NOT_IMAGE, MSG_IMAGE_MIMES]);
  }

  #[test]
  fn webp_is_an_image_in_the_wrong_format() {
    let webp = ImageUpload::new("x.webp", Bytes::from_static(b"RIFF\x00\x00\x00\x00WEBPVP8 "));
    let errors =
      validate(&payload("t", "d", "1", Some(webp)), ValidationMode::Create, &ValidationRules::default()).unwrap_err();

    assert_eq!(errors.field("image"), [MSG_IMAGE_MIMES]);
  }

  #[test]
  fn svg_is_sniffed_from_markup() {
    let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
    assert_eq!(ImageFormat::sniff(svg), Some(ImageFormat::Svg));
    assert_eq!(ImageFormat::sniff(b"hello <svg>"), None);
  }

  #[test]
  fn svg_with_a_character_cut_by_the_window_is_still_svg() {
    let open = r#"<svg xmlns="http://www.w3.org/2000/svg"><title>"#;
    let mut svg = open.to_string();
    svg.push_str(&"a".repeat(SVG_SNIFF_WINDOW - 1 - open.len()));
    svg.push_str("ñandú</title></svg>");
    assert_eq!(&svg.as_bytes()[SVG_SNIFF_WINDOW - 1..SVG_SNIFF_WINDOW + 1], "ñ".as_bytes());

    assert_eq!(ImageFormat::sniff(svg.as_bytes()), Some(ImageFormat::Svg));
  }

  #[test]
  fn svg_root_after_a_long_prolog_is_found() {
    let svg = format!(
      "<?xml version=\"1.0\"?>\n<!-- {} -->\n<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>",
      "Diseño de la silla. ".repeat(100)
    );
    assert!(svg.len() > 1024);
    assert_eq!(ImageFormat::sniff(svg.as_bytes()), Some(ImageFormat::Svg));
  }

  #[test]
  fn text_starting_with_bm_is_not_an_image() {
    let text = ImageUpload::new("coche.jpg", Bytes::from_static("BMW de segunda mano, muy cuidado.".as_bytes()));
    let errors =
      validate(&payload("t", "d", "1", Some(text)), ValidationMode::Create, &ValidationRules::default()).unwrap_err();
    assert_eq!(errors.field("image"), [MSG_IMAGE_NOT_IMAGE, MSG_IMAGE_MIMES]);

    let mut bmp = b"BM\x46\x00\x00\x00\x00\x00\x00\x00\x36\x00\x00\x00".to_vec();
    bmp.extend_from_slice(&40u32.to_le_bytes());
    assert_eq!(ImageFormat::sniff(&bmp), Some(ImageFormat::Bmp));
  }

  #[test]
  fn image_over_the_limit_is_rejected() {
    let mut big = ImageUpload::new("big.png", Bytes::from_static(b"\x89PNG\r\n\x1a\n...."));
    big.size = 2048 * 1024 + 1;
    let errors =
      validate(&payload("t", "d", "1", Some(big)), ValidationMode::Create, &ValidationRules::default()).unwrap_err();
    assert_eq!(errors.field("image"), ["La imagen no debe exceder los 2MB.".to_string()]);

    let mut at_limit = ImageUpload::new("ok.png", Bytes::from_static(b"\x89PNG\r\n\x1a\n...."));
    at_limit.size = 2048 * 1024;
    assert!(validate(&payload("t", "d", "1", Some(at_limit)), ValidationMode::Create, &ValidationRules::default()).is_ok());
  }

  #[test]
  fn update_image_requirement_follows_the_policy() {
    let no_image = payload("t", "d", "1", None);

    let errors = validate(&no_image, ValidationMode::Update, &ValidationRules::default()).unwrap_err();
    assert_eq!(errors.field("image"), [MSG_IMAGE_REQUIRED]);

    let keep = ValidationRules {
      image_policy: ImagePolicy::KeepExisting,
      ..ValidationRules::default()
    };
    let validated = validate(&no_image, ValidationMode::Update, &keep).unwrap();
    assert!(validated.image.is_none());

    // Create still demands an image whatever the policy.
    assert!(validate(&no_image, ValidationMode::Create, &keep).is_err());
  }
}
