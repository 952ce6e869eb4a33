use serde::Deserialize;

/// Response from `/applet/v2/photo/select-page`.
#[derive(Debug, Deserialize)]
pub struct SelectPageResponse {
    pub data: SelectPageData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPageData {
    #[serde(default)]
    pub result: Vec<PhotoItem>,
    #[serde(default)]
    pub page_no: Option<u32>,
    #[serde(default)]
    pub total_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoItem {
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub etag: String,
}

/// Response from `/applet/v2/order/detail`.
#[derive(Debug, Deserialize)]
pub struct OrderDetailResponse {
    #[serde(default)]
    pub data: Option<OrderDetailData>,
}

#[derive(Debug, Deserialize)]
pub struct OrderDetailData {
    #[serde(default)]
    pub title: Option<String>,
}
