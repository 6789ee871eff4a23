//! View collaborator for the non-API routes.
//!
//! Handlers gather the data and hand a [`View`] to a [`ViewRenderer`]. The
//! built-in [`HtmlRenderer`] emits bare HTML; a template engine can take its
//! place through [`crate::AppState::with_views`].

use crate::{
    error::ApiError,
    middleware::{auth::Identity, sanitize::escape_markup},
    models::{Review, Tour},
};
use std::fmt::Write;

/// A page and the data it shows.
#[derive(Debug)]
pub enum View<'a> {
    Overview { tours: &'a [Tour] },
    Tour { tour: &'a Tour, reviews: &'a [Review] },
    Login,
    Account { user: &'a Identity },
}

impl View<'_> {
    pub fn title(&self) -> String {
        match self {
            View::Overview { .. } => "All Tours".to_string(),
            View::Tour { tour, .. } => format!("{} Tour", tour.name),
            View::Login => "Log into your account".to_string(),
            View::Account { .. } => "Your account".to_string(),
        }
    }
}

pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &View<'_>) -> Result<String, ApiError>;
}

/// Minimal renderer without templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl ViewRenderer for HtmlRenderer {
    fn render(&self, view: &View<'_>) -> Result<String, ApiError> {
        let mut body = String::new();
        let write_err = |e: std::fmt::Error| ApiError::Internal(e.into());

        match view {
            View::Overview { tours } => {
                body.push_str("<ul class=\"card-container\">");
                for tour in tours.iter() {
                    write!(
                        body,
                        "<li><a href=\"/tour/{}\">{}</a> {} days, ${}</li>",
                        escape_markup(&tour.slug),
                        escape_markup(&tour.name),
                        tour.duration,
                        tour.price
                    )
                    .map_err(write_err)?;
                }
                body.push_str("</ul>");
            }
            View::Tour { tour, reviews } => {
                write!(
                    body,
                    "<h1>{}</h1><p>{}</p><p>{} / 5 ({} ratings)</p><ul class=\"reviews\">",
                    escape_markup(&tour.name),
                    escape_markup(tour.summary.as_deref().unwrap_or_default()),
                    tour.ratings_average,
                    tour.ratings_quantity
                )
                .map_err(write_err)?;
                for review in reviews.iter() {
                    write!(body, "<li>{} ({}/5)</li>", escape_markup(&review.review), review.rating)
                        .map_err(write_err)?;
                }
                body.push_str("</ul>");
            }
            View::Login => {
                body.push_str(
                    "<form class=\"form--login\" method=\"post\" action=\"/api/v1/users/login\">\
                     <input name=\"email\" type=\"email\"><input name=\"password\" type=\"password\">\
                     <button>Login</button></form>",
                );
            }
            View::Account { user } => {
                write!(
                    body,
                    "<h2>{}</h2><p>{}</p><p>{}</p>",
                    escape_markup(&user.name),
                    escape_markup(&user.email),
                    user.role
                )
                .map_err(write_err)?;
            }
        }

        Ok(format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>Natours | {}</title></head><body>{}</body></html>",
            escape_markup(&view.title()),
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use uuid::Uuid;

    #[test]
    fn test_account_page_escapes_user_data() {
        let user = Identity {
            id: Uuid::new_v4(),
            name: "<b>Ann</b>".into(),
            email: "ann@example.com".into(),
            role: Role::User,
        };

        let html = HtmlRenderer.render(&View::Account { user: &user }).unwrap();
        assert!(html.contains("&lt;b&gt;Ann&lt;/b&gt;"));
        assert!(html.contains("<title>Natours | Your account</title>"));
    }

    #[test]
    fn test_login_page() {
        let html = HtmlRenderer.render(&View::Login).unwrap();
        assert!(html.contains("form--login"));
    }
}
