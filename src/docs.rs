use crate::modules::auth::dto::*;
use crate::modules::conversion::dto::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::handler::register,
        crate::modules::auth::handler::login,
        crate::modules::auth::handler::get_me,
        crate::modules::conversion::handler::convert,
        crate::modules::conversion::handler::reconvert,
        crate::modules::conversion::handler::history,
        crate::modules::conversion::stream_handler::download,
    ),
    components(
        schemas(
            RegisterRequest, LoginRequest, AuthResponse, UserResponse,
            ReconvertRequest, ReconvertResponse,
            ConversionSummary, SourceInfo, ResultInfo, MediaInfo,
        )
    ),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Conversion", description = "Video conversion, history and downloads")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::Modify;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
