use api_contract::ApiResponse;

#[test]
fn api_response_success() {
    let response = ApiResponse::success("ok");
    assert!(response.success);
    assert!(response.data.is_some());
    assert!(response.error.is_none());
}

#[test]
fn api_response_error() {
    let response = ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found");
    assert!(!response.success);
    assert!(response.data.is_none());

    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["error"]["code"], "RESOURCE.NOT_FOUND");
    assert_eq!(value["error"]["message"], "not found");
}
