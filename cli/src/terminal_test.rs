use super::*;

use client::net::types::{ChatItem, ChatMessage, DateSeparator, MessageType, Poll, PollOption};
use client::render::{Placement, Renderer};

fn text(id: MessageId, author: &str, content: &str) -> ChatItem {
    ChatItem::Message(ChatMessage {
        id,
        author: author.into(),
        content: content.into(),
        created_at: "09:41".into(),
        message_type: MessageType::Text,
        poll: None,
    })
}

fn output(sink: TerminalSink<Vec<u8>>) -> String {
    String::from_utf8(sink.into_output()).unwrap()
}

#[test]
fn appends_are_silent_until_live() {
    let renderer = Renderer::default();
    let mut sink = TerminalSink::new(Vec::new());
    renderer.render(&mut sink, &text(1, "vera", "hi"), Placement::Append);
    sink.go_live();
    renderer.render(&mut sink, &text(2, "vera", "again"), Placement::Append);

    assert_eq!(output(sink), " [09:41] #2 vera: again\n");
}

#[test]
fn print_all_walks_view_top_to_bottom() {
    let renderer = Renderer::default();
    let mut sink = TerminalSink::new(Vec::new());
    renderer.render(&mut sink, &text(5, "vera", "five"), Placement::Append);
    renderer.render(&mut sink, &text(4, "vera", "four"), Placement::Prepend);
    renderer.render(
        &mut sink,
        &ChatItem::DateSeparator(DateSeparator { date: "18.10.2026".into(), date_readable: "Сегодня".into() }),
        Placement::Prepend,
    );
    sink.print_all();

    assert_eq!(output(sink), "-- Сегодня --\n [09:41] #4 vera: four\n [09:41] #5 vera: five\n");
}

#[test]
fn duplicates_are_not_echoed() {
    let renderer = Renderer::default();
    let mut sink = TerminalSink::new(Vec::new());
    sink.go_live();
    renderer.render(&mut sink, &text(1, "vera", "hi"), Placement::Append);
    renderer.render(&mut sink, &text(1, "vera", "hi"), Placement::Append);

    assert_eq!(output(sink).lines().count(), 1);
}

#[test]
fn own_multiline_message_is_marked_and_indented() {
    let renderer = Renderer::new(Some("vera".into()));
    let mut sink = TerminalSink::new(Vec::new());
    renderer.render(&mut sink, &text(3, "vera", "line one\nline two"), Placement::Append);

    let line = format_node(&sink.view().nodes()[0]);
    assert_eq!(line, "*[09:41] #3 vera: line one\n    line two");
}

#[test]
fn poll_lists_options_with_votes() {
    let item = ChatItem::Message(ChatMessage {
        id: 8,
        author: "gleb".into(),
        content: "Голосование: Чай?".into(),
        created_at: "12:00".into(),
        message_type: MessageType::Poll,
        poll: Some(Poll {
            id: 2,
            question: "Чай?".into(),
            is_active: false,
            multiple_choice: false,
            total_votes: 4,
            options: vec![
                PollOption { id: 1, text: "да".into(), vote_count: 3, vote_percentage: 75.0, user_voted: true },
                PollOption { id: 2, text: "нет".into(), vote_count: 1, vote_percentage: 25.0, user_voted: false },
            ],
        }),
    });
    let mut sink = TerminalSink::new(Vec::new());
    Renderer::default().render(&mut sink, &item, Placement::Append);

    let line = format_node(&sink.view().nodes()[0]);
    assert_eq!(
        line,
        " [12:00] #8 gleb: poll #2 Чай? (closed) [4 votes]\n    [x] 1: да (3 / 75%)\n    [ ] 2: нет (1 / 25%)"
    );
}
