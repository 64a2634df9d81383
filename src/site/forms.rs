/// Contact form relays
///
/// Each submission becomes one HTML email to the submitter. Delivery
/// failures are reported back as JSON and never retried.
use crate::{
    context::AppContext,
    error::{SiteError, StatusResponse},
};
use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use serde::Deserialize;

/// Build form routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/contact-submit", post(contact_submit))
        .route("/loss-recovery-submit", post(loss_recovery_submit))
}

/// Contact / pricing form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    /// Used as the email subject
    pub plan: String,
    #[serde(rename = "calling-hours")]
    pub calling_hours: String,
}

/// Loss recovery programme form
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LossRecoveryForm {
    pub name: String,
    pub email: String,
    pub country: String,
    pub whatsapp: String,
    #[serde(rename = "account-size")]
    pub account_size: String,
    #[serde(rename = "past-loss")]
    pub past_loss: String,
    /// Checkbox: "on" when ticked, absent otherwise
    #[serde(rename = "running-trades")]
    pub running_trades: Option<String>,
}

impl LossRecoveryForm {
    pub fn has_running_trades(&self) -> bool {
        self.running_trades.as_deref() == Some("on")
    }
}

type FormResponse = (StatusCode, Json<StatusResponse>);

async fn contact_submit(
    State(ctx): State<AppContext>,
    Form(form): Form<ContactForm>,
) -> FormResponse {
    tracing::info!("contact_submit: plan={:?} country={:?}", form.plan, form.country);

    let fields = [
        ("Phone Number", form.phone.clone()),
        ("Preferred Time", form.calling_hours.clone()),
        ("Country", form.country.clone()),
    ];

    let result = ctx
        .mailer
        .send(&form.email, &form.plan, &form.name, &fields)
        .await;

    respond(
        result,
        "Your message has been sent successfully!",
        "Sorry, there was an error sending your message. Please try again later.",
    )
}

async fn loss_recovery_submit(
    State(ctx): State<AppContext>,
    Form(form): Form<LossRecoveryForm>,
) -> FormResponse {
    tracing::info!("loss_recovery_submit: country={:?}", form.country);

    let running_trades = if form.has_running_trades() { "True" } else { "False" };
    let fields = [
        ("Phone Number", form.whatsapp.clone()),
        ("Account Size", form.account_size.clone()),
        ("Loss size", form.past_loss.clone()),
        ("Country", form.country.clone()),
        ("Running trades present", running_trades.to_string()),
    ];

    let result = ctx
        .mailer
        .send(&form.email, "Loss recovery program", &form.name, &fields)
        .await;

    respond(
        result,
        "Your details have been submitted successfully!",
        "Sorry, there was an error submitting your details. Please try again.",
    )
}

fn respond(result: Result<(), SiteError>, success: &str, failure: &str) -> FormResponse {
    match result {
        Ok(()) => (StatusCode::OK, Json(StatusResponse::success(success))),
        Err(SiteError::Validation(msg)) => {
            tracing::warn!("Rejected form submission: {}", msg);
            (StatusCode::BAD_REQUEST, Json(StatusResponse::error(msg)))
        }
        Err(e) => {
            tracing::error!("Error sending email: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse::error(failure)),
            )
        }
    }
}
