/// Project, task, comment, tag and audit use cases against the in-memory store

mod common;

use workboard_shared::models::audit_log::{AuditAction, AuditEntityType, AuditFilter};
use workboard_shared::models::membership::MembershipRole;
use workboard_shared::models::project::UpdateProject;
use workboard_shared::models::task::{NewTask, SortOrder, TaskFilter, TaskStatus, UpdateTask};
use workboard_shared::services::{
    audit, comments, organizations, projects, tags, tasks, ServiceError,
};
use workboard_shared::store::{MemoryStore, Store};

async fn project(store: &MemoryStore, fixture: &common::OrgFixture, name: &str) -> i64 {
    projects::create_project(
        store,
        fixture.owner.id,
        name.into(),
        None,
        fixture.organization.id,
        vec![],
    )
    .await
    .unwrap()
    .project
    .id
}

async fn task(store: &MemoryStore, user_id: i64, project_id: i64, title: &str) -> i64 {
    tasks::create_task(store, user_id, project_id, title.into(), None)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_create_project_with_tasks() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;

    let created = projects::create_project(
        &store,
        fixture.owner.id,
        "Launch".into(),
        Some("Q3".into()),
        fixture.organization.id,
        vec![
            NewTask {
                title: "Plan".into(),
                description: None,
            },
            NewTask {
                title: "Ship".into(),
                description: Some("Friday".into()),
            },
        ],
    )
    .await
    .unwrap();

    assert_eq!(created.tasks.len(), 2);
    assert!(created.tasks.iter().all(|t| t.status == TaskStatus::Todo));
    assert!(created.tasks.iter().all(|t| t.project_id == created.project.id));

    let logs = store
        .list_audit_logs(
            &AuditFilter {
                entity_type: Some(AuditEntityType::Project),
                ..Default::default()
            },
            50,
        )
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].entity_id, created.project.id);
    assert_eq!(logs[0].metadata["taskCount"], 2);
}

#[tokio::test]
async fn test_keyset_pagination() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let ids = vec![
        project(&store, &fixture, "one").await,
        project(&store, &fixture, "two").await,
        project(&store, &fixture, "three").await,
    ];
    let org_id = fixture.organization.id;

    let first = projects::list_projects(&store, fixture.owner.id, org_id, None, Some(2))
        .await
        .unwrap();
    assert_eq!(first.data.iter().map(|p| p.id).collect::<Vec<_>>(), ids[..2]);
    assert_eq!(first.next_cursor, Some(ids[2]));

    let second =
        projects::list_projects(&store, fixture.owner.id, org_id, first.next_cursor, Some(2))
            .await
            .unwrap();
    assert_eq!(second.data.iter().map(|p| p.id).collect::<Vec<_>>(), ids[2..]);
    assert_eq!(second.next_cursor, None);

    let all = projects::list_projects(&store, fixture.owner.id, org_id, None, None)
        .await
        .unwrap();
    assert_eq!(all.data.len(), 3);
    assert_eq!(all.next_cursor, None);

    let err = projects::list_projects(&store, fixture.owner.id, org_id, None, Some(0))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_non_member_is_rejected_everywhere() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let outsider = common::user(&store, "outsider@example.com").await;
    let project_id = project(&store, &fixture, "Secret").await;
    let task_id = task(&store, fixture.owner.id, project_id, "hidden").await;

    let denied = |err: ServiceError| assert_eq!(err.code(), "ACCESS_DENIED");

    denied(projects::get_project(&store, outsider.id, project_id).await.unwrap_err());
    denied(
        projects::list_projects(&store, outsider.id, fixture.organization.id, None, None)
            .await
            .unwrap_err(),
    );
    denied(
        tasks::list_tasks(
            &store,
            outsider.id,
            TaskFilter {
                project_id,
                ..Default::default()
            },
        )
        .await
        .unwrap_err(),
    );
    denied(tasks::get_task(&store, outsider.id, task_id).await.unwrap_err());
    denied(
        tasks::change_task_status(&store, outsider.id, task_id, TaskStatus::InProgress)
            .await
            .unwrap_err(),
    );
    denied(
        comments::create_comment(&store, outsider.id, task_id, "hi".into())
            .await
            .unwrap_err(),
    );
    denied(
        tags::list_tags(&store, outsider.id, fixture.organization.id)
            .await
            .unwrap_err(),
    );
}

#[tokio::test]
async fn test_missing_entity_reported_before_membership() {
    let store = MemoryStore::new();
    let outsider = common::user(&store, "outsider@example.com").await;

    assert_eq!(
        projects::get_project(&store, outsider.id, 404).await.unwrap_err().code(),
        "PROJECT_NOT_FOUND"
    );
    assert_eq!(
        tasks::get_task(&store, outsider.id, 404).await.unwrap_err().code(),
        "TASK_NOT_FOUND"
    );
    assert_eq!(
        comments::delete_comment(&store, outsider.id, 404).await.unwrap_err().code(),
        "COMMENT_NOT_FOUND"
    );
}

#[tokio::test]
async fn test_role_gating() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let member =
        common::member(&store, &fixture, "member@example.com", MembershipRole::Member).await;
    let admin = common::member(&store, &fixture, "admin@example.com", MembershipRole::Admin).await;
    let project_id = project(&store, &fixture, "Roadmap").await;

    // Members create and update tasks
    let task_id = task(&store, member.id, project_id, "write docs").await;
    let updated = tasks::update_task(
        &store,
        member.id,
        task_id,
        UpdateTask {
            title: Some("write more docs".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "write more docs");

    // but cannot delete tasks or touch the project
    assert_eq!(
        tasks::delete_task(&store, member.id, task_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );
    assert_eq!(
        projects::update_project(&store, member.id, project_id, UpdateProject::default())
            .await
            .unwrap_err()
            .code(),
        "FORBIDDEN"
    );
    assert_eq!(
        projects::delete_project(&store, member.id, project_id).await.unwrap_err().code(),
        "FORBIDDEN"
    );

    // Admins and owners can
    let renamed = projects::update_project(
        &store,
        admin.id,
        project_id,
        UpdateProject {
            name: Some("Roadmap 2".into()),
            description: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "Roadmap 2");

    tasks::delete_task(&store, admin.id, task_id).await.unwrap();
    assert!(store.find_task(task_id).await.unwrap().is_none());

    projects::delete_project(&store, fixture.owner.id, project_id).await.unwrap();
    assert_eq!(
        projects::get_project(&store, fixture.owner.id, project_id).await.unwrap_err().code(),
        "PROJECT_NOT_FOUND"
    );
}

#[tokio::test]
async fn test_status_transitions() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let member =
        common::member(&store, &fixture, "member@example.com", MembershipRole::Member).await;
    let project_id = project(&store, &fixture, "Flow").await;
    let task_id = task(&store, member.id, project_id, "move me").await;

    let err = tasks::change_task_status(&store, member.id, task_id, TaskStatus::Done)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");
    assert_eq!(err.to_string(), "Invalid status transition from TODO to DONE");

    for next in [
        TaskStatus::InProgress,
        TaskStatus::Done,
        TaskStatus::InProgress,
        TaskStatus::Done,
    ] {
        let task = tasks::change_task_status(&store, member.id, task_id, next).await.unwrap();
        assert_eq!(task.status, next);
    }

    let err = tasks::change_task_status(&store, member.id, task_id, TaskStatus::Todo)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidStatusTransition {
            from: TaskStatus::Done,
            to: TaskStatus::Todo
        }
    ));

    let changes = store
        .list_audit_logs(
            &AuditFilter {
                action: Some(AuditAction::StatusChanged),
                ..Default::default()
            },
            50,
        )
        .await
        .unwrap();
    assert_eq!(changes.len(), 4);
    assert_eq!(changes[0].metadata["newStatus"], "DONE");
    assert!(changes.iter().all(|log| log.entity_id == task_id));
}

#[tokio::test]
async fn test_assignee_must_be_member() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let member =
        common::member(&store, &fixture, "member@example.com", MembershipRole::Member).await;
    let outsider = common::user(&store, "outsider@example.com").await;
    let project_id = project(&store, &fixture, "People").await;
    let task_id = task(&store, fixture.owner.id, project_id, "assign me").await;

    let err = tasks::update_task(
        &store,
        fixture.owner.id,
        task_id,
        UpdateTask {
            assignee_id: Some(outsider.id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "INVALID_ASSIGNEE");

    let assigned = tasks::update_task(
        &store,
        fixture.owner.id,
        task_id,
        UpdateTask {
            assignee_id: Some(member.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(assigned.assignee_id, Some(member.id));

    let filtered = tasks::list_tasks(
        &store,
        member.id,
        TaskFilter {
            project_id,
            assignee_id: Some(member.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_list_tasks_filters_and_order() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let project_id = project(&store, &fixture, "Board").await;
    let first = task(&store, fixture.owner.id, project_id, "first").await;
    let second = task(&store, fixture.owner.id, project_id, "second").await;
    tasks::change_task_status(&store, fixture.owner.id, second, TaskStatus::InProgress)
        .await
        .unwrap();

    let newest_first = tasks::list_tasks(
        &store,
        fixture.owner.id,
        TaskFilter {
            project_id,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(newest_first.iter().map(|t| t.id).collect::<Vec<_>>(), vec![second, first]);

    let oldest_first = tasks::list_tasks(
        &store,
        fixture.owner.id,
        TaskFilter {
            project_id,
            order: SortOrder::Asc,
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(oldest_first.iter().map(|t| t.id).collect::<Vec<_>>(), vec![first, second]);

    let in_progress = tasks::list_tasks(
        &store,
        fixture.owner.id,
        TaskFilter {
            project_id,
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].id, second);
}

#[tokio::test]
async fn test_comment_deletion_rules() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let author =
        common::member(&store, &fixture, "author@example.com", MembershipRole::Member).await;
    let other = common::member(&store, &fixture, "other@example.com", MembershipRole::Member).await;
    let admin = common::member(&store, &fixture, "admin@example.com", MembershipRole::Admin).await;
    let project_id = project(&store, &fixture, "Talk").await;
    let task_id = task(&store, author.id, project_id, "discuss").await;

    let mine = comments::create_comment(&store, author.id, task_id, "first!".into())
        .await
        .unwrap();
    assert_eq!(mine.author_id, author.id);

    let err = comments::delete_comment(&store, other.id, mine.id).await.unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");

    comments::delete_comment(&store, author.id, mine.id).await.unwrap();

    let theirs = comments::create_comment(&store, other.id, task_id, "second".into())
        .await
        .unwrap();
    comments::delete_comment(&store, admin.id, theirs.id).await.unwrap();
    assert!(store.find_comment(theirs.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_tag_attachment_rules() {
    let store = MemoryStore::new();
    let acme = common::organization(&store, "Acme").await;
    let globex = common::organization(&store, "Globex").await;
    let project_id = project(&store, &acme, "Tags").await;
    let task_id = task(&store, acme.owner.id, project_id, "label me").await;

    let bug = tags::create_tag(&store, acme.owner.id, acme.organization.id, "bug".into())
        .await
        .unwrap();
    let foreign = tags::create_tag(&store, globex.owner.id, globex.organization.id, "bug".into())
        .await
        .unwrap();

    let listed = tags::list_tags(&store, acme.owner.id, acme.organization.id).await.unwrap();
    assert_eq!(listed, vec![bug.clone()]);

    let err = tags::attach_tag(&store, acme.owner.id, task_id, foreign.id).await.unwrap_err();
    assert_eq!(err.code(), "TAG_NOT_FOUND");

    let err = tags::detach_tag(&store, acme.owner.id, task_id, bug.id).await.unwrap_err();
    assert_eq!(err.code(), "TAG_NOT_ATTACHED");

    let attached = tags::attach_tag(&store, acme.owner.id, task_id, bug.id).await.unwrap();
    assert_eq!((attached.task_id, attached.tag_id), (task_id, bug.id));

    let err = tags::attach_tag(&store, acme.owner.id, task_id, bug.id).await.unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    tags::detach_tag(&store, acme.owner.id, task_id, bug.id).await.unwrap();

    let tag_logs = store
        .list_audit_logs(
            &AuditFilter {
                entity_type: Some(AuditEntityType::Tag),
                ..Default::default()
            },
            50,
        )
        .await
        .unwrap();
    let actions: Vec<_> = tag_logs
        .iter()
        .filter(|log| log.entity_id == bug.id)
        .map(|log| log.action)
        .collect();
    assert_eq!(actions, vec![AuditAction::Detached, AuditAction::Attached, AuditAction::Created]);
}

#[tokio::test]
async fn test_audit_visibility() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let outsider = common::user(&store, "outsider@example.com").await;
    project(&store, &fixture, "Visible").await;

    let org_logs = audit::list_audit_logs(
        &store,
        fixture.owner.id,
        AuditFilter {
            organization_id: Some(fixture.organization.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(org_logs.len() >= 2);
    assert!(org_logs.windows(2).all(|w| w[0].created_at >= w[1].created_at));

    let err = audit::list_audit_logs(
        &store,
        outsider.id,
        AuditFilter {
            organization_id: Some(fixture.organization.id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), "ACCESS_DENIED");

    // Without an organization only one's own entries are visible
    organizations::create_organization(&store, outsider.id, "Solo".into())
        .await
        .unwrap();
    let own = audit::list_audit_logs(&store, outsider.id, AuditFilter::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|log| log.user_id == outsider.id));
    assert!(own.iter().all(|log| log.organization_id != Some(fixture.organization.id)));

    let kinds: Vec<_> = own.iter().map(|log| (log.entity_type, log.action)).collect();
    assert!(kinds.contains(&(AuditEntityType::User, AuditAction::Created)));
    assert!(kinds.contains(&(AuditEntityType::Organization, AuditAction::Created)));
}

#[tokio::test]
async fn test_audit_listing_is_capped() {
    let store = MemoryStore::new();
    let fixture = common::organization(&store, "Acme").await;
    let project_id = project(&store, &fixture, "Busy").await;

    for i in 0..60 {
        task(&store, fixture.owner.id, project_id, &format!("task {}", i)).await;
    }

    let logs = audit::list_audit_logs(
        &store,
        fixture.owner.id,
        AuditFilter {
            organization_id: Some(fixture.organization.id),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(logs.len(), 50);
}
