//! `GET /v1/models` and `GET /v1beta/models` (§4.6, §6): both list the full
//! model catalog, including every thinking/search variant, each shaped for
//! its schema.

use axum::Json;
use pollux_schema::gemini::{GeminiModel, GeminiModelList};
use pollux_schema::openai::{OpenaiModel, OpenaiModelList};

use crate::catalog;

pub async fn openai_list() -> Json<OpenaiModelList> {
    let data = catalog::catalog()
        .into_iter()
        .map(|model| OpenaiModel {
            id: model.name,
            object: "model".to_string(),
            owned_by: "google".to_string(),
            display_name: model.display_name,
        })
        .collect();
    Json(OpenaiModelList {
        object: "list".to_string(),
        data,
    })
}

pub async fn gemini_list() -> Json<GeminiModelList> {
    let models = catalog::catalog()
        .into_iter()
        .map(|model| GeminiModel {
            name: format!("models/{}", model.name),
            display_name: model.display_name,
            description: Some(model.description),
            supported_generation_methods: Some(vec!["generateContent".to_string(), "streamGenerateContent".to_string()]),
            ..Default::default()
        })
        .collect();
    Json(GeminiModelList { models })
}
