use crate::client::{FormField, RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult};
use crate::models::{EmotionResponse, ImageSource};

impl VisionClient {
    /// Classify the facial expression in the live camera or an uploaded image.
    pub async fn emotion(&self, source: &ImageSource) -> EndpointResult<EmotionResponse> {
        self.call(
            EndpointFamily::Emotion,
            RequestSpec::post("emotion").multipart(FormField::image_fields(source)),
        )
        .await
    }
}
