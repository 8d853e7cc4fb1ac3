//! Common test utilities and mock implementations.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use celebration_bot::event::EventMatch;
use celebration_bot::messenger::MessageSender;
use celebration_bot::messenger::error::SendError;
use celebration_bot::poster::PosterRenderer;
use celebration_bot::poster::error::PosterError;
use image::ImageFormat;
use image::Rgb;
use image::RgbImage;
use mockall::mock;

mock! {
    pub Sender {}

    #[async_trait]
    impl MessageSender for Sender {
        async fn send_photo(
            &self,
            chat_id: &str,
            photo: &[u8],
            caption: &str,
        ) -> Result<(), SendError>;
    }
}

mock! {
    pub Renderer {}

    #[async_trait]
    impl PosterRenderer for Renderer {
        async fn render(&self, event: &EventMatch) -> Result<Vec<u8>, PosterError>;
    }
}

/// Path of a file under `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/fixtures");
    path.push(filename);
    path
}

#[allow(dead_code)]
pub fn event(name: &str, event_name: &str, telegram_id: Option<&str>) -> EventMatch {
    EventMatch {
        name: name.to_string(),
        photo_ref: format!("{}.png", name.to_lowercase()),
        telegram_id: telegram_id.map(str::to_string),
        event_name: event_name.to_string(),
    }
}

/// PNG bytes of a solid colour image.
#[allow(dead_code)]
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}
