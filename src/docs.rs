use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::process_video,
    ),
    components(
        schemas(
            crate::modules::video::dto::PushEnvelope,
            crate::modules::video::dto::PushMessage,
            crate::modules::video::dto::VideoNotification,
        )
    ),
    tags(
        (name = "Processing", description = "Video transcoding jobs")
    )
)]
pub struct ApiDoc;
