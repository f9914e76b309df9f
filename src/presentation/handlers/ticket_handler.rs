use super::validate_input;
use crate::{
    application::services::{NotificationCenter, TicketService},
    domain::{
        entities::{TicketDraft, TicketPatch},
        projection::{MembershipFilter, SortDirection, SortSpec, TicketFilter, TicketSortField},
        value_objects::{TicketCategory, TicketPriority, TicketStatus, VoteDirection},
    },
    presentation::dto::{
        CreateResponse, DismissNotificationRequest, IdRequest, MutationResponse,
        NotificationResponse, parse_entity_id, parse_user_id, parse_variant, parse_variants,
        ticket_dto::{
            AddCommentRequest, CreateTicketRequest, SetSearchRequest, SetSortRequest,
            SetTicketFilterRequest, TicketListResponse, TicketResponse, UpdateTicketRequest,
            VoteTicketRequest,
        },
    },
    shared::error::AppError,
};
use std::sync::Arc;

pub struct TicketHandler {
    ticket_service: Arc<TicketService>,
    notifications: Arc<NotificationCenter>,
}

impl TicketHandler {
    pub fn new(ticket_service: Arc<TicketService>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            ticket_service,
            notifications,
        }
    }

    pub async fn create_ticket(
        &self,
        request: CreateTicketRequest,
    ) -> Result<CreateResponse, AppError> {
        validate_input(&request)?;

        let priority = request
            .priority
            .as_deref()
            .map(parse_variant::<TicketPriority>)
            .transpose()?
            .unwrap_or_default();
        let category = request
            .category
            .as_deref()
            .map(parse_variant::<TicketCategory>)
            .transpose()?
            .unwrap_or_default();

        let receipt = self
            .ticket_service
            .create_ticket(TicketDraft {
                title: request.title,
                description: request.description,
                priority,
                category,
                tags: request.tags,
                reporter: Some(parse_user_id(&request.reporter)?),
            })
            .await?;

        Ok(receipt.into())
    }

    pub async fn update_ticket(
        &self,
        request: UpdateTicketRequest,
    ) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let id = parse_entity_id(&request.id)?;
        let assignee = request
            .assignee
            .map(|assignee| {
                if assignee.trim().is_empty() {
                    Ok(None)
                } else {
                    parse_user_id(&assignee).map(Some)
                }
            })
            .transpose()?;
        let patch = TicketPatch {
            title: request.title,
            description: request.description,
            status: request
                .status
                .as_deref()
                .map(parse_variant::<TicketStatus>)
                .transpose()?,
            priority: request
                .priority
                .as_deref()
                .map(parse_variant::<TicketPriority>)
                .transpose()?,
            category: request
                .category
                .as_deref()
                .map(parse_variant::<TicketCategory>)
                .transpose()?,
            tags: request.tags,
            assignee,
        };

        let outcome = self.ticket_service.update_ticket(id, patch).await?;
        Ok(outcome.into())
    }

    pub async fn delete_ticket(&self, request: IdRequest) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let id = parse_entity_id(&request.id)?;
        let outcome = self.ticket_service.delete_ticket(id).await?;
        Ok(outcome.into())
    }

    pub async fn vote_ticket(
        &self,
        request: VoteTicketRequest,
    ) -> Result<MutationResponse, AppError> {
        validate_input(&request)?;

        let outcome = self
            .ticket_service
            .vote(
                parse_entity_id(&request.ticket_id)?,
                parse_user_id(&request.user_id)?,
                parse_variant::<VoteDirection>(&request.direction)?,
            )
            .await?;
        Ok(outcome.into())
    }

    pub async fn add_comment(
        &self,
        request: AddCommentRequest,
    ) -> Result<CreateResponse, AppError> {
        validate_input(&request)?;

        let receipt = self
            .ticket_service
            .add_comment(
                parse_entity_id(&request.ticket_id)?,
                parse_user_id(&request.author)?,
                request.content,
            )
            .await?;
        Ok(receipt.into())
    }

    pub async fn set_filter(&self, request: SetTicketFilterRequest) -> Result<(), AppError> {
        let filter = TicketFilter {
            status: MembershipFilter::only(parse_variants::<TicketStatus>(&request.statuses)?),
            priority: MembershipFilter::only(parse_variants::<TicketPriority>(
                &request.priorities,
            )?),
            category: MembershipFilter::only(parse_variants::<TicketCategory>(
                &request.categories,
            )?),
        };
        self.ticket_service.set_filter(filter).await;
        Ok(())
    }

    pub async fn set_sort(&self, request: SetSortRequest) -> Result<(), AppError> {
        validate_input(&request)?;

        let field = parse_variant::<TicketSortField>(&request.field)?;
        let direction = request
            .direction
            .as_deref()
            .map(parse_variant::<SortDirection>)
            .transpose()?
            .unwrap_or_default();
        self.ticket_service
            .set_sort(SortSpec::new(field, direction))
            .await;
        Ok(())
    }

    pub async fn set_search(&self, request: SetSearchRequest) {
        self.ticket_service.set_search(&request.query).await;
    }

    pub async fn list_tickets(&self) -> TicketListResponse {
        let tickets = self.ticket_service.projection().await;
        let total = self.ticket_service.snapshot().await.len();

        TicketListResponse {
            tickets: tickets.into_iter().map(TicketResponse::from).collect(),
            total,
            version: self.ticket_service.mutator().version(),
        }
    }

    pub async fn notifications(&self) -> Vec<NotificationResponse> {
        self.notifications
            .active()
            .await
            .into_iter()
            .map(NotificationResponse::from)
            .collect()
    }

    pub async fn dismiss_notification(&self, request: DismissNotificationRequest) -> bool {
        self.notifications.dismiss(request.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Ticket;
    use crate::infrastructure::memory::InMemoryRemoteStore;
    use crate::shared::ValidationFailureKind;
    use crate::shared::config::{MutationConfig, NotificationConfig};

    fn handler() -> (TicketHandler, Arc<InMemoryRemoteStore<Ticket>>) {
        let store = Arc::new(InMemoryRemoteStore::<Ticket>::new());
        let notifications = Arc::new(NotificationCenter::new(&NotificationConfig::default()));
        let service = Arc::new(TicketService::new(
            store.clone(),
            &MutationConfig::default(),
            Arc::clone(&notifications),
        ));
        (TicketHandler::new(service, notifications), store)
    }

    fn create_request(title: &str, priority: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.to_string(),
            description: String::new(),
            priority: Some(priority.to_string()),
            category: None,
            tags: vec!["Dashboard".to_string()],
            reporter: "qa-lead".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_vote_and_list() {
        let (handler, _store) = handler();
        let created = handler
            .create_ticket(create_request("Chart is blank", "high"))
            .await
            .unwrap();
        assert_eq!(created.outcome, "committed");
        let id = created.id.unwrap();

        let voted = handler
            .vote_ticket(VoteTicketRequest {
                ticket_id: id.clone(),
                user_id: "mentor-7".to_string(),
                direction: "up".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(voted.outcome, "committed");

        let list = handler.list_tickets().await;
        assert_eq!(list.total, 1);
        assert_eq!(list.tickets[0].id, id);
        assert_eq!(list.tickets[0].votes, 1);
        assert_eq!(list.tickets[0].tags, vec!["dashboard".to_string()]);
        assert!(!list.tickets[0].pending);
    }

    #[tokio::test]
    async fn test_unknown_priority_is_rejected_before_any_change() {
        let (handler, store) = handler();
        let err = handler
            .create_ticket(create_request("Bad priority", "urgent"))
            .await
            .unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationFailureKind::UnknownVariant));
        assert_eq!(handler.list_tickets().await.total, 0);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_update_surfaces_notification() {
        let (handler, store) = handler();
        let id = handler
            .create_ticket(create_request("Typo", "low"))
            .await
            .unwrap()
            .id
            .unwrap();

        store.fail_next(1);
        let response = handler
            .update_ticket(UpdateTicketRequest {
                id,
                status: Some("resolved".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.outcome, "rolled_back");
        assert_eq!(handler.list_tickets().await.tickets[0].status, "open");

        let notifications = handler.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, "error");
        assert!(
            handler
                .dismiss_notification(DismissNotificationRequest {
                    id: notifications[0].id
                })
                .await
        );
        assert!(handler.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn test_filter_sort_and_search_requests() {
        let (handler, _store) = handler();
        let rows = [
            ("Crash on save", "critical"),
            ("Crash on load", "low"),
            ("Slow", "high"),
        ];
        for (title, priority) in rows {
            handler
                .create_ticket(create_request(title, priority))
                .await
                .unwrap();
        }

        handler
            .set_search(SetSearchRequest {
                query: "  CRASH ".to_string(),
            })
            .await;
        handler
            .set_sort(SetSortRequest {
                field: "priority".to_string(),
                direction: Some("asc".to_string()),
            })
            .await
            .unwrap();
        let titles: Vec<String> = handler
            .list_tickets()
            .await
            .tickets
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Crash on load", "Crash on save"]);

        handler
            .set_filter(SetTicketFilterRequest {
                priorities: vec!["critical".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        let list = handler.list_tickets().await;
        assert_eq!(list.tickets.len(), 1);
        assert_eq!(list.total, 3);

        assert!(
            handler
                .set_filter(SetTicketFilterRequest {
                    statuses: vec!["archived".to_string()],
                    ..Default::default()
                })
                .await
                .is_err()
        );
    }
}
