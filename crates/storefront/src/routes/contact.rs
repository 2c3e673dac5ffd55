//! Contact form route handlers.
//!
//! Validation failures stay field-level and local to the form; a valid
//! submission is forwarded to the backend's `POST /contact`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::instrument;

use lunetier_core::Email;

use crate::filters;
use crate::marketplace::ContactMessage;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub nom: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub sujet: String,
    #[serde(default)]
    pub message: String,
}

/// Field-level validation messages; empty string means no error.
#[derive(Debug, Clone, Default)]
pub struct ContactErrors {
    pub nom: String,
    pub email: String,
    pub message: String,
    pub global: String,
}

impl ContactErrors {
    fn validate(form: &ContactForm) -> Self {
        let mut errors = Self::default();
        if form.nom.trim().is_empty() {
            errors.nom = "Veuillez indiquer votre nom.".to_owned();
        }
        if let Err(e) = Email::parse(form.email.trim()) {
            tracing::debug!(error = %e, "invalid contact email");
            errors.email = "Veuillez saisir une adresse email valide.".to_owned();
        }
        if form.message.trim().is_empty() {
            errors.message = "Veuillez saisir un message.".to_owned();
        }
        errors
    }

    fn is_clean(&self) -> bool {
        self.nom.is_empty() && self.email.is_empty() && self.message.is_empty() && self.global.is_empty()
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact/show.html")]
pub struct ContactTemplate {
    pub form: ContactForm,
    pub errors: ContactErrors,
    pub sent: bool,
}

/// Display the contact form.
#[instrument]
pub async fn show() -> ContactTemplate {
    ContactTemplate {
        form: ContactForm::default(),
        errors: ContactErrors::default(),
        sent: false,
    }
}

/// Submit the contact form.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let errors = ContactErrors::validate(&form);
    if !errors.is_clean() {
        return ContactTemplate {
            form,
            errors,
            sent: false,
        };
    }

    let message = ContactMessage {
        nom: form.nom.trim().to_owned(),
        email: form.email.trim().to_lowercase(),
        sujet: {
            let sujet = form.sujet.trim();
            if sujet.is_empty() {
                None
            } else {
                Some(sujet.to_owned())
            }
        },
        message: form.message.trim().to_owned(),
    };

    match state.marketplace().submit_contact(&message).await {
        Ok(()) => {
            tracing::info!("contact message forwarded");
            ContactTemplate {
                form: ContactForm::default(),
                errors: ContactErrors::default(),
                sent: true,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to forward contact message");
            ContactTemplate {
                form,
                errors: ContactErrors {
                    global: e.user_message(),
                    ..ContactErrors::default()
                },
                sent: false,
            }
        }
    }
}
