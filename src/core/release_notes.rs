use crate::domain::model::{NewPage, PageCreation, PublishedPage, ReleaseLabel};
use crate::domain::ports::WikiSystem;
use crate::utils::error::{ReleaseError, Result};
use chrono::NaiveDate;

pub const ENVIRONMENT_LABEL_PREFIX: &str = "RE.";
pub const DEFAULT_MACRO_COLUMNS: &str = "key,components,summary,status,fixversions,epic link";
pub const DEFAULT_ORDER_BY: &str = "\"Epic Link\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSettings {
    pub columns: String,
    pub order_by: String,
}

impl Default for MacroSettings {
    fn default() -> Self {
        Self {
            columns: DEFAULT_MACRO_COLUMNS.to_string(),
            order_by: DEFAULT_ORDER_BY.to_string(),
        }
    }
}

/// `staging` -> `RE.staging`
pub fn environment_label(environment: &str) -> String {
    if environment.starts_with(ENVIRONMENT_LABEL_PREFIX) {
        environment.to_string()
    } else {
        format!("{}{}", ENVIRONMENT_LABEL_PREFIX, environment)
    }
}

pub fn page_title(environment_label: &str, date: NaiveDate) -> String {
    format!(
        "{} Release Notes {}",
        environment_label.replace(ENVIRONMENT_LABEL_PREFIX, ""),
        date.format("%Y-%m-%d")
    )
}

/// Storage-format body embedding a Jira issues macro filtered by both labels.
pub fn page_body(environment_label: &str, label: &ReleaseLabel, settings: &MacroSettings) -> String {
    format!(
        "<p><ac:structured-macro ac:name=\"jira\" ac:schema-version=\"1\">\
         <ac:parameter ac:name=\"columns\">{}</ac:parameter>\
         <ac:parameter ac:name=\"jqlQuery\">labels = {} AND labels = {} ORDER BY {}</ac:parameter>\
         </ac:structured-macro></p>",
        settings.columns, environment_label, label, settings.order_by
    )
}

pub fn build_page(
    environment: &str,
    label: &ReleaseLabel,
    date: NaiveDate,
    settings: &MacroSettings,
) -> NewPage {
    let env_label = environment_label(environment);
    NewPage {
        title: page_title(&env_label, date),
        body: page_body(&env_label, label, settings),
    }
}

/// Creates the release notes page, or reports the existing one when the title is taken.
pub async fn publish<W: WikiSystem + ?Sized>(wiki: &W, page: &NewPage) -> Result<PublishedPage> {
    tracing::info!("📝 Creating release notes page '{}'", page.title);

    match wiki.create_page(page).await? {
        PageCreation::Created { link } => {
            tracing::info!("Release Notes links : {}", link);
            Ok(PublishedPage {
                title: page.title.clone(),
                link,
                already_existed: false,
            })
        }
        PageCreation::AlreadyExists => {
            tracing::info!("Page '{}' already exists, looking it up", page.title);
            let link = wiki
                .find_page(&page.title)
                .await?
                .ok_or_else(|| ReleaseError::ExternalService {
                    service: "confluence".to_string(),
                    status: 404,
                    message: format!(
                        "page '{}' was reported as existing but could not be found",
                        page.title
                    ),
                })?;
            tracing::info!("Page already existed at : {}", link);
            Ok(PublishedPage {
                title: page.title.clone(),
                link,
                already_existed: true,
            })
        }
    }
}
