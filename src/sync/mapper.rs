//! Translation of Source issues into the canonical `IssueInput`.

use crate::model::{AttachmentInput, CommentInput, Issue, IssueInput, LabelInput, User};

fn user_label(user: Option<&User>) -> Option<String> {
    user.and_then(User::label).map(str::to_string)
}

#[must_use]
pub fn to_issue_input(issue: &Issue) -> IssueInput {
    IssueInput {
        id: issue.id.clone(),
        identifier: issue.identifier.clone(),
        title: issue.title.clone(),
        description: issue.description.clone(),
        priority: issue.priority,
        state_name: issue.state.as_ref().map(|s| s.name.clone()),
        state_type: issue.state.as_ref().map(|s| s.state_type),
        assignee_id: issue.assignee.as_ref().map(|u| u.id.clone()),
        assignee_name: user_label(issue.assignee.as_ref()),
        assignee_email: issue.assignee.as_ref().and_then(|u| u.email.clone()),
        creator_id: issue.creator.as_ref().map(|u| u.id.clone()),
        creator_name: user_label(issue.creator.as_ref()),
        team_id: issue.team.as_ref().map(|t| t.id.clone()),
        team_key: issue.team.as_ref().map(|t| t.key.clone()),
        team_name: issue.team.as_ref().map(|t| t.name.clone()),
        labels: issue
            .labels
            .nodes
            .iter()
            .map(|label| LabelInput {
                id: label.id.clone(),
                name: label.name.clone(),
                color: label.color.clone(),
            })
            .collect(),
        comments: issue
            .comments
            .nodes
            .iter()
            .map(|comment| CommentInput {
                id: comment.id.clone(),
                body: comment.body.clone(),
                author_name: user_label(comment.user.as_ref()),
                created_at: comment.created_at,
                updated_at: comment.updated_at,
            })
            .collect(),
        attachments: issue
            .attachments
            .nodes
            .iter()
            .map(|attachment| AttachmentInput {
                id: attachment.id.clone(),
                title: attachment.title.clone(),
                url: attachment.url.clone(),
                source_type: attachment.source_type.clone(),
                creator_name: user_label(attachment.creator.as_ref()),
                created_at: attachment.created_at,
            })
            .collect(),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        url: issue.url.clone(),
    }
}
