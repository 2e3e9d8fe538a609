//! Input checks performed before any store or blob call.

use crate::{error::ValidationError, song::AudioUpload};

/// Largest accepted audio upload (10 MiB).
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// File extensions accepted as audio, lowercase.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a", "aac"];

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trimmed, non-empty song title.
pub fn title(raw: &str) -> Result<String, ValidationError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(ValidationError::MissingTitle);
  }
  Ok(trimmed.to_string())
}

/// Normalise optional free text: trimmed, and blank becomes `None`.
pub fn optional_text(raw: Option<String>) -> Option<String> {
  raw
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
}

/// Lowercased extension of `file_name`, if it is a known audio type.
pub fn audio_extension(file_name: &str) -> Option<String> {
  let (stem, ext) = file_name.rsplit_once('.')?;
  if stem.is_empty() {
    return None;
  }
  let ext = ext.to_ascii_lowercase();
  AUDIO_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Check an upload and return the extension to store it under.
pub fn upload(upload: Option<&AudioUpload>) -> Result<String, ValidationError> {
  let upload = upload.ok_or(ValidationError::MissingAudio)?;
  if upload.bytes.is_empty() {
    return Err(ValidationError::EmptyAudio);
  }
  if upload.bytes.len() > MAX_AUDIO_BYTES {
    return Err(ValidationError::AudioTooLarge {
      size:  upload.bytes.len(),
      limit: MAX_AUDIO_BYTES,
    });
  }
  audio_extension(&upload.file_name)
    .ok_or_else(|| ValidationError::UnsupportedAudio(upload.file_name.clone()))
}

pub fn username(raw: &str) -> Result<String, ValidationError> {
  let name = raw.trim();
  let valid_chars = name
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if !(3..=32).contains(&name.len()) || !valid_chars {
    return Err(ValidationError::InvalidUsername);
  }
  Ok(name.to_string())
}

pub fn email(raw: &str) -> Result<String, ValidationError> {
  let email = raw.trim();
  match email.split_once('@') {
    Some((local, domain))
      if !local.is_empty() && domain.contains('.') && !domain.contains('@') =>
    {
      Ok(email.to_string())
    }
    _ => Err(ValidationError::InvalidEmail),
  }
}

pub fn password(raw: &str) -> Result<(), ValidationError> {
  if raw.chars().count() < MIN_PASSWORD_LEN {
    return Err(ValidationError::WeakPassword(MIN_PASSWORD_LEN));
  }
  Ok(())
}
