use std::sync::Arc;

use crate::config::Config;
use crate::database::responder_store::ResponderStore;
use crate::dto::admin_dto::{AddResponderForm, EditFieldPayload, EditResponderForm, ResponderListQuery};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::responder::{
    NewResponder, ResponderChanges, ResponderField, ResponderQuery, ResponderRow, SortDirection,
};
use crate::utils::permissions::expand_permission_tokens;
use crate::utils::validation::{field_errors, FieldErrors};

const MAX_PAGE_SIZE: i64 = 500;

/// Listing behavior taken from configuration.
#[derive(Debug, Clone)]
pub struct ListSettings {
    pub restricted_role: String,
    pub bot_id: Option<i64>,
    pub max_record_count: i64,
    pub default_direction: SortDirection,
}

impl ListSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let default_direction: SortDirection = config
            .order_type
            .parse()
            .map_err(|e: String| Error::Config(e))?;
        Ok(Self {
            restricted_role: config.restricted_role.clone(),
            bot_id: config.bot_id,
            max_record_count: config.max_record_count.clamp(1, MAX_PAGE_SIZE),
            default_direction,
        })
    }
}

#[derive(Debug)]
pub struct ResponderList {
    pub rows: Vec<ResponderRow>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

pub enum AddOutcome {
    Created(i64),
    Invalid {
        form: AddResponderForm,
        errors: FieldErrors,
    },
}

pub enum EditOutcome {
    Updated,
    /// The statement ran but matched nothing; reported as a warning.
    NotUpdated,
    Invalid {
        form: EditResponderForm,
        errors: FieldErrors,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum EditFieldOutcome {
    Updated(u64),
    Rejected(String),
}

pub fn parse_record_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::BadRequest(format!("Invalid record id: {}", raw)))
}

/// Splits a comma-separated id list, ignoring blank entries.
pub fn parse_record_ids(raw: &str) -> Result<Vec<i64>> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(parse_record_id)
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        return Err(Error::BadRequest("No record id supplied".to_string()));
    }
    Ok(ids)
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Resolves a user-supplied field/value pair, normalizing numeric values.
fn resolve_field(field: &str, value: &str) -> Result<(ResponderField, String)> {
    let field: ResponderField = field.parse().map_err(Error::BadRequest)?;
    let value = match field {
        ResponderField::Id | ResponderField::BotId => value
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::BadRequest(format!("Invalid value for {}: {}", field, value)))?
            .to_string(),
        ResponderField::TextRecieved | ResponderField::ResponseByBot => value.to_string(),
    };
    Ok((field, value))
}

#[derive(Clone)]
pub struct ResponderService {
    store: Arc<dyn ResponderStore>,
    settings: ListSettings,
}

impl ResponderService {
    pub fn new(store: Arc<dyn ResponderStore>, settings: ListSettings) -> Self {
        Self { store, settings }
    }

    /// Token allow-list for role-restricted callers, `None` for everyone else.
    async fn allowed_texts(&self, claims: &Claims) -> Result<Option<Vec<String>>> {
        if claims.role.as_deref() != Some(self.settings.restricted_role.as_str()) {
            return Ok(None);
        }
        let user_id: i64 = claims
            .sub
            .trim()
            .parse()
            .map_err(|_| Error::Unauthorized("Invalid session subject".to_string()))?;
        let permission = self.store.user_permission(user_id).await?.unwrap_or_default();
        let tokens = expand_permission_tokens(&permission);
        tracing::debug!(user_id, tokens = tokens.len(), "restricting listing to permission tokens");
        Ok(Some(tokens))
    }

    async fn build_query(
        &self,
        claims: &Claims,
        params: &ResponderListQuery,
        field_filter: Option<(&str, &str)>,
    ) -> Result<ResponderQuery> {
        let search = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let order_by = match params.orderby.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse().map_err(Error::BadRequest)?,
            None => ResponderField::Id,
        };
        let direction = match params.ordertype.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.parse().map_err(Error::BadRequest)?,
            None => self.settings.default_direction,
        };

        let field_filter = field_filter
            .map(|(field, value)| resolve_field(field, value))
            .transpose()?;

        Ok(ResponderQuery {
            search,
            order_by,
            direction,
            field_filter,
            allowed_texts: self.allowed_texts(claims).await?,
            bot_id: self.settings.bot_id,
            limit: None,
            offset: 0,
        })
    }

    pub async fn list(
        &self,
        claims: &Claims,
        params: &ResponderListQuery,
        field_filter: Option<(&str, &str)>,
    ) -> Result<ResponderList> {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params
            .limit
            .unwrap_or(self.settings.max_record_count)
            .clamp(1, MAX_PAGE_SIZE);

        let mut query = self.build_query(claims, params, field_filter).await?;
        query.limit = Some(limit);
        query.offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| Error::BadRequest(format!("Page {} is out of range", page)))?;

        let result = self.store.list(&query).await?;
        Ok(ResponderList {
            total_pages: total_pages(result.total, limit),
            rows: result.rows,
            total: result.total,
            page,
            limit,
        })
    }

    /// Every row the caller may list, for the report export.
    pub async fn export_rows(
        &self,
        claims: &Claims,
        params: &ResponderListQuery,
    ) -> Result<Vec<ResponderRow>> {
        let query = self.build_query(claims, params, None).await?;
        Ok(self.store.list(&query).await?.rows)
    }

    pub async fn view(&self, rec_id: &str) -> Result<ResponderRow> {
        let id = parse_record_id(rec_id)?;
        self.store
            .find_by(ResponderField::Id, &id.to_string())
            .await?
            .ok_or_else(|| Error::NotFound("No record found".to_string()))
    }

    pub async fn view_by(&self, field: &str, value: &str) -> Result<ResponderRow> {
        let (field, value) = resolve_field(field, value)?;
        self.store
            .find_by(field, &value)
            .await?
            .ok_or_else(|| Error::NotFound("No record found".to_string()))
    }

    pub async fn add(&self, form: AddResponderForm) -> Result<AddOutcome> {
        let form = form.normalized();
        let errors = field_errors(&form);
        if !errors.is_empty() {
            return Ok(AddOutcome::Invalid { form, errors });
        }
        let form = form.sanitized();

        let botid = form
            .botid
            .as_deref()
            .map(parse_record_id)
            .transpose()?
            .ok_or_else(|| Error::BadRequest("botid is required".to_string()))?;
        let id = self
            .store
            .insert(NewResponder {
                text_recieved: form.text_recieved.unwrap_or_default(),
                response_by_bot: form.response_by_bot.unwrap_or_default(),
                botid,
            })
            .await?;
        tracing::info!(rec_id = id, botid, "responder record added");
        Ok(AddOutcome::Created(id))
    }

    pub async fn edit(&self, rec_id: &str, form: EditResponderForm) -> Result<EditOutcome> {
        let id = parse_record_id(rec_id)?;
        let form = form.normalized();
        let errors = field_errors(&form);
        if !errors.is_empty() {
            return Ok(EditOutcome::Invalid { form, errors });
        }
        let form = form.sanitized();

        let affected = self
            .store
            .update(
                id,
                ResponderChanges {
                    text_recieved: form.text_recieved,
                    response_by_bot: form.response_by_bot,
                },
            )
            .await?;
        if affected == 0 {
            tracing::warn!(rec_id = id, "edit matched no responder record");
            return Ok(EditOutcome::NotUpdated);
        }
        tracing::info!(rec_id = id, "responder record updated");
        Ok(EditOutcome::Updated)
    }

    /// Updates one editable field, checking only that field's rules.
    pub async fn edit_field(
        &self,
        rec_id: &str,
        payload: EditFieldPayload,
    ) -> Result<EditFieldOutcome> {
        let id = parse_record_id(rec_id)?;
        let field: ResponderField = payload.name.parse().map_err(Error::BadRequest)?;

        let mut form = EditResponderForm::default();
        match field {
            ResponderField::TextRecieved => form.text_recieved = payload.value,
            ResponderField::ResponseByBot => form.response_by_bot = payload.value,
            ResponderField::Id | ResponderField::BotId => {
                return Err(Error::BadRequest(format!("Field '{}' is not editable", field)));
            }
        }
        let form = form.normalized();
        let mut errors = field_errors(&form);
        errors.retain_fields(&[field.column()]);
        if let Some(message) = errors.first_message() {
            return Ok(EditFieldOutcome::Rejected(message.to_string()));
        }
        let form = form.sanitized();

        let affected = self
            .store
            .update(
                id,
                ResponderChanges {
                    text_recieved: form.text_recieved,
                    response_by_bot: form.response_by_bot,
                },
            )
            .await?;
        if affected == 0 {
            return Ok(EditFieldOutcome::Rejected("No record updated".to_string()));
        }
        tracing::info!(rec_id = id, field = %field, "responder field updated");
        Ok(EditFieldOutcome::Updated(affected))
    }

    /// Removes every listed id in one statement; unknown ids are ignored.
    pub async fn delete(&self, rec_ids: &str) -> Result<u64> {
        let ids = parse_record_ids(rec_ids)?;
        let removed = self.store.delete_many(&ids).await?;
        tracing::info!(requested = ids.len(), removed, "responder records deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::responder_store::MockResponderStore;
    use crate::models::responder::ResponderPage;

    fn settings() -> ListSettings {
        ListSettings {
            restricted_role: "2".to_string(),
            bot_id: Some(4),
            max_record_count: 20,
            default_direction: SortDirection::Asc,
        }
    }

    fn claims(sub: &str, role: Option<&str>) -> Claims {
        Claims {
            sub: sub.to_string(),
            exp: usize::MAX,
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn id_lists_are_trimmed() {
        assert_eq!(parse_record_ids(" 1, 3 ,99").unwrap(), vec![1, 3, 99]);
        assert_eq!(parse_record_ids("5,").unwrap(), vec![5]);
        assert!(parse_record_ids("1,x").is_err());
        assert!(parse_record_ids(" , ").is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }

    #[tokio::test]
    async fn list_applies_defaults_and_bot_scope() {
        let mut store = MockResponderStore::new();
        store.expect_user_permission().never();
        store
            .expect_list()
            .withf(|q| {
                q.order_by == ResponderField::Id
                    && q.direction == SortDirection::Asc
                    && q.bot_id == Some(4)
                    && q.limit == Some(20)
                    && q.offset == 20
                    && q.allowed_texts.is_none()
                    && q.search.as_deref() == Some("alp")
            })
            .returning(|_| Ok(ResponderPage { rows: vec![], total: 41 }));
        let service = ResponderService::new(Arc::new(store), settings());

        let params = ResponderListQuery {
            search: Some("  alp ".into()),
            page: Some(2),
            ..Default::default()
        };
        let list = service.list(&claims("1", Some("1")), &params, None).await.unwrap();
        assert_eq!(list.total_pages, 3);
        assert_eq!(list.page, 2);
    }

    #[tokio::test]
    async fn huge_page_number_is_rejected_before_querying() {
        let mut store = MockResponderStore::new();
        store.expect_list().never();
        let service = ResponderService::new(Arc::new(store), settings());

        let params = ResponderListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        let err = service
            .list(&claims("1", Some("1")), &params, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn restricted_role_looks_up_permission_tokens() {
        let mut store = MockResponderStore::new();
        store
            .expect_user_permission()
            .withf(|id| *id == 12)
            .times(1)
            .returning(|_| Ok(Some("5,7".to_string())));
        store
            .expect_list()
            .withf(|q| {
                q.allowed_texts.as_ref().map(Vec::len) == Some(10)
                    && q.allowed_texts
                        .as_ref()
                        .is_some_and(|t| t.contains(&"M7".to_string()))
            })
            .returning(|_| Ok(ResponderPage::default()));
        let service = ResponderService::new(Arc::new(store), settings());

        service
            .list(&claims("12", Some("2")), &ResponderListQuery::default(), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_sort_column_is_rejected() {
        let store = MockResponderStore::new();
        let service = ResponderService::new(Arc::new(store), settings());
        let params = ResponderListQuery {
            orderby: Some("password".into()),
            ..Default::default()
        };
        let err = service.list(&claims("1", None), &params, None).await;
        assert!(matches!(err, Err(Error::BadRequest(_))));
    }

    #[tokio::test]
    async fn zero_affected_rows_is_a_warning_not_an_error() {
        let mut store = MockResponderStore::new();
        store.expect_update().returning(|_, _| Ok(0));
        let service = ResponderService::new(Arc::new(store), settings());

        let outcome = service
            .edit(
                "8",
                EditResponderForm {
                    text_recieved: Some("a".into()),
                    response_by_bot: Some("b".into()),
                },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, EditOutcome::NotUpdated));
    }

    #[tokio::test]
    async fn invalid_add_never_inserts() {
        let mut store = MockResponderStore::new();
        store.expect_insert().never();
        let service = ResponderService::new(Arc::new(store), settings());

        let outcome = service
            .add(AddResponderForm {
                text_recieved: Some("hi".into()),
                response_by_bot: None,
                botid: Some("seven".into()),
            })
            .await
            .unwrap();
        match outcome {
            AddOutcome::Invalid { errors, .. } => {
                assert!(errors.get("response_by_bot").is_some());
                assert!(errors.get("botid").is_some());
                assert!(errors.get("text_recieved").is_none());
            }
            AddOutcome::Created(_) => panic!("invalid form was inserted"),
        }
    }

    #[tokio::test]
    async fn edit_field_checks_only_the_named_field() {
        let mut store = MockResponderStore::new();
        store
            .expect_update()
            .withf(|id, changes| {
                *id == 3
                    && changes.response_by_bot.as_deref() == Some("new reply")
                    && changes.text_recieved.is_none()
            })
            .returning(|_, _| Ok(1));
        let service = ResponderService::new(Arc::new(store), settings());

        let outcome = service
            .edit_field(
                "3",
                EditFieldPayload {
                    name: "response_by_bot".into(),
                    value: Some(" new reply ".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome, EditFieldOutcome::Updated(1));

        let rejected = service
            .edit_field(
                "3",
                EditFieldPayload {
                    name: "text_recieved".into(),
                    value: Some("".into()),
                },
            )
            .await
            .unwrap();
        assert!(matches!(rejected, EditFieldOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn edit_field_refuses_key_columns() {
        let store = MockResponderStore::new();
        let service = ResponderService::new(Arc::new(store), settings());
        let err = service
            .edit_field(
                "3",
                EditFieldPayload {
                    name: "botid".into(),
                    value: Some("9".into()),
                },
            )
            .await;
        assert!(matches!(err, Err(Error::BadRequest(_))));
    }
}
