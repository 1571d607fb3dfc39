//! Minimal Telnyx REST client for the in-call actions the LLM processor's
//! tag vocabulary can trigger: transfer and DTMF (§4.8, §4.13). The dial
//! call itself lives in `dialer.rs`; this is the smaller in-call surface.

pub struct TelnyxClient {
    http: reqwest::Client,
    api_key: String,
}

impl TelnyxClient {
    pub fn new(api_key: String) -> Self {
        Self { http: reqwest::Client::new(), api_key }
    }

    pub async fn transfer(&self, call_control_id: &str, to: &str) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telnyx.com/v2/calls/{call_control_id}/actions/transfer");
        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "to": to }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn send_dtmf(&self, call_control_id: &str, digits: &str) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telnyx.com/v2/calls/{call_control_id}/actions/send_dtmf");
        self.http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "digits": digits }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
