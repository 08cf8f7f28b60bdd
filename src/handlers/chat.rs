use crate::{error::ApiError, models::ChatRequest, services::LibrarianService};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn chat_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/chat").route(web::post().to(chat)));
}

/// Recommend one book for a free-text request. Rejections (empty, blocked,
/// gibberish, no candidates, no close match) surface as 400s with their
/// category message; backend failures as 502.
pub async fn chat(
    request: Json<ChatRequest>,
    librarian: web::Data<LibrarianService>,
) -> Result<HttpResponse, ApiError> {
    let recommendation = librarian.recommend(&request.query).await?;
    Ok(HttpResponse::Ok().json(recommendation))
}
