use crate::client::{FormField, RequestSpec, VisionClient};
use crate::error::{EndpointFamily, EndpointResult};
use crate::models::{FaceLast, ImageSource, RecognizeResponse, RegisterResponse};

impl VisionClient {
    /// Result of the backend's own periodic recognition.
    pub async fn face_last(&self) -> EndpointResult<FaceLast> {
        self.call(EndpointFamily::FaceLast, RequestSpec::get("face/last"))
            .await
    }

    /// Enroll `name` from the live camera or an uploaded image.
    pub async fn register_face(
        &self,
        name: &str,
        source: &ImageSource,
    ) -> EndpointResult<RegisterResponse> {
        let mut fields = vec![FormField::text("name", name)];
        fields.extend(FormField::image_fields(source));
        self.call(
            EndpointFamily::FaceRegister,
            RequestSpec::post("face/register").multipart(fields),
        )
        .await
    }

    /// Identify the face in the live camera or an uploaded image.
    pub async fn recognize_face(&self, source: &ImageSource) -> EndpointResult<RecognizeResponse> {
        self.call(
            EndpointFamily::FaceRecognize,
            RequestSpec::post("face/recognize").multipart(FormField::image_fields(source)),
        )
        .await
    }
}
