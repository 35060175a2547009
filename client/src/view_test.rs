use super::*;
use crate::net::types::{ChatItem, ChatMessage, DateSeparator, MessageType, OptionTally, Poll, PollOption};
use crate::render::{Placement, Renderer};

fn push(view: &mut ChatView, item: ChatItem, placement: Placement) {
    Renderer::default().render(view, &item, placement);
}

fn msg(id: MessageId) -> ChatItem {
    ChatItem::Message(ChatMessage {
        id,
        author: "a".into(),
        content: "line".into(),
        created_at: String::new(),
        message_type: MessageType::Text,
        poll: None,
    })
}

#[test]
fn new_view_is_empty_and_attached() {
    let view = ChatView::new(300);
    assert!(view.is_empty());
    assert!(view.is_attached());
    assert_eq!(view.scroll_metrics(), ScrollMetrics { offset: 0, content_height: 0, viewport_height: 300 });
}

#[test]
fn first_and_last_message_skip_separators() {
    let mut view = ChatView::default();
    push(&mut view, ChatItem::DateSeparator(DateSeparator { date: "d".into(), date_readable: "r".into() }), Placement::Append);
    push(&mut view, msg(3), Placement::Append);
    push(&mut view, msg(4), Placement::Append);
    assert_eq!(view.first_message_id(), Some(3));
    assert_eq!(view.last_message_id(), Some(4));
}

#[test]
fn content_height_sums_node_heights() {
    let mut view = ChatView::default();
    push(&mut view, msg(1), Placement::Append);
    push(&mut view, msg(2), Placement::Prepend);
    let one = 2 * ROW_HEIGHT + NODE_PADDING;
    assert_eq!(view.scroll_metrics().content_height, one * 2);
}

#[test]
fn scroll_offset_is_clamped_to_content() {
    let mut view = ChatView::new(40);
    push(&mut view, msg(1), Placement::Append);
    push(&mut view, msg(2), Placement::Append);
    view.set_scroll_offset(10_000);
    let m = view.scroll_metrics();
    assert_eq!(m.offset, m.content_height - 40);
}

#[test]
fn scroll_to_bottom_shows_last_node() {
    let mut view = ChatView::new(50);
    for id in 1..=5 {
        push(&mut view, msg(id), Placement::Append);
    }
    view.scroll_to_bottom();
    let m = view.scroll_metrics();
    assert_eq!(m.offset + m.viewport_height, m.content_height);
}

#[test]
fn short_content_never_scrolls() {
    let mut view = ChatView::new(10_000);
    push(&mut view, msg(1), Placement::Append);
    view.scroll_to_bottom();
    assert_eq!(view.scroll_metrics().offset, 0);
}

#[test]
fn date_text_lookup_ignores_surrounding_whitespace() {
    let mut view = ChatView::default();
    push(
        &mut view,
        ChatItem::DateSeparator(DateSeparator { date: "a".into(), date_readable: " Вчера ".into() }),
        Placement::Append,
    );
    assert!(view.has_date_text("Вчера"));
    assert!(view.has_date("a"));
}

#[test]
fn detach_marks_view_torn_down() {
    let mut view = ChatView::default();
    view.detach();
    assert!(!view.is_attached());
}

#[test]
fn apply_poll_tally_targets_matching_widget() {
    let mut view = ChatView::default();
    push(
        &mut view,
        ChatItem::Message(ChatMessage {
            id: 1,
            author: "a".into(),
            content: String::new(),
            created_at: String::new(),
            message_type: MessageType::Poll,
            poll: Some(Poll {
                id: 7,
                question: "?".into(),
                is_active: true,
                multiple_choice: false,
                total_votes: 0,
                options: vec![PollOption { id: 70, text: "x".into(), vote_count: 0, vote_percentage: 0.0, user_voted: false }],
            }),
        }),
        Placement::Append,
    );
    let tally = VoteTally {
        voted: true,
        total_votes: 1,
        options: vec![OptionTally { id: 70, vote_count: 1, vote_percentage: 100.0, user_voted: true }],
    };
    assert!(view.apply_poll_tally(7, &tally));
    assert!(!view.apply_poll_tally(8, &tally));

    let ViewNode::Message(node) = &view.nodes()[0] else { panic!("expected message") };
    let MessageBody::Poll(widget) = &node.body else { panic!("expected poll") };
    assert_eq!(widget.total_votes, 1);
    assert!(widget.options[0].voted);
}
