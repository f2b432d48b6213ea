pub mod messages;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use crate::types;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok" };
        assert_eq!(h.status, "ok");
    }

    #[test]
    fn envelope_skips_empty_fields() {
        let body = types::ApiResponse::<()>::new(crate::messages::SUCCESS);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "Success"}));
    }

    #[test]
    fn envelope_carries_detail_data_errors() {
        let body = types::ApiResponse::new(crate::messages::CREATED)
            .with_detail("made a thing")
            .with_data(serde_json::json!({"id": 1}));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "Created");
        assert_eq!(json["detail"], "made a thing");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("errors").is_none());
    }
}
