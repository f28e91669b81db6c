mod fixture;

use std::cell::RefCell;
use std::rc::Rc;

use ask_tui::{EnvConfig, InputFramer, Runtime, TextBox, TextBoxController, Widget};
use fixture::TestTerminal;

fn runtime(widget: TextBox, keys: &[&str]) -> Runtime<TestTerminal> {
    let terminal = TestTerminal::new(20, 24).with_keys(keys);
    let mut runtime = Runtime::with_config(terminal, widget.into_node(), &EnvConfig::default());
    runtime.start().unwrap();
    for _ in keys {
        assert!(runtime.tick().unwrap());
    }
    runtime
}

fn controller(runtime: &Runtime<TestTerminal>) -> &TextBoxController {
    let tree = runtime.tree();
    let id = tree.find::<TextBoxController>().unwrap();
    tree.controller::<TextBoxController>(id).unwrap()
}

#[test]
fn type_then_kill_to_line_end() {
    let runtime = runtime(TextBox::new(), &["H", "e", "l", "l", "o", "\x01", "\x0b"]);
    let text_box = controller(&runtime);
    assert_eq!(text_box.text(), "");
    assert_eq!(text_box.cursor(), 0);
    assert_eq!(text_box.kill_buffer(), "Hello");
}

#[test]
fn delete_previous_word() {
    let runtime = runtime(TextBox::new().text("Hi Hello World"), &["\x1b\x7f"]);
    let text_box = controller(&runtime);
    assert_eq!(text_box.text(), "Hi Hello ");
    assert_eq!(text_box.cursor(), 9);
}

#[test]
fn paging_back_through_history() {
    let widget = TextBox::new()
        .text("third")
        .history(vec!["first".to_string(), "second".to_string()]);
    let runtime = runtime(widget, &["\x1b[5~", "\x1b[5~"]);
    let text_box = controller(&runtime);
    assert_eq!(text_box.text(), "first");
    assert_eq!(text_box.cursor(), 5);
    assert_eq!(text_box.history_index(), 0);
}

#[test]
fn undo_restores_text_and_cursor() {
    let mut runtime = runtime(TextBox::new().text("abc"), &[]);
    let id = runtime.tree().find::<TextBoxController>().unwrap();
    let handle = runtime.tree().handle::<TextBoxController>(id).unwrap();
    handle.update(|text_box| text_box.set_cursor(1));
    runtime.tree_mut().drain_messages();
    runtime.terminal_mut().inputs.push_back(vec!["x".to_string()]);
    runtime.terminal_mut().inputs.push_back(vec!["\x1f".to_string()]);

    assert!(runtime.tick().unwrap());
    assert_eq!(controller(&runtime).text(), "axbc");
    assert!(runtime.tick().unwrap());
    let text_box = controller(&runtime);
    assert_eq!(text_box.text(), "abc");
    assert_eq!(text_box.cursor(), 1);
}

#[test]
fn typing_is_redrawn_in_place() {
    let mut runtime = runtime(TextBox::new(), &[]);
    runtime.terminal_mut().take_written();
    runtime.terminal_mut().inputs.push_back(vec!["H".to_string()]);
    runtime.tick().unwrap();
    let written = runtime.terminal_mut().take_written();
    assert!(written.starts_with("\x1b[1A"));
    assert!(ask_tui::strip_styles(&written).contains('H'));
}

#[test]
fn bracketed_paste_keeps_its_newlines() {
    let submitted = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&submitted);
    let widget = TextBox::new().on_submit(move |text| {
        sink.borrow_mut().push(text.to_string());
        true
    });
    let mut runtime = runtime(widget, &[]);
    assert!(runtime.terminal().written.contains("\x1b[?2004h"));

    let mut framer = InputFramer::default();
    let keys = framer.push(b"\x1b[200~line one\rline two\x1b[201~");
    assert_eq!(keys, vec!["line one\rline two"]);
    runtime.terminal_mut().inputs.push_back(keys);
    assert!(runtime.tick().unwrap());

    assert_eq!(controller(&runtime).text(), "line one\nline two");
    assert!(submitted.borrow().is_empty());
}
