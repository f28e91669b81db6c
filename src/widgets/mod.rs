//! Higher-level widgets built from Text and Box elements.

pub mod diff_view;
pub mod markdown;
pub mod option_list;
pub mod spinner;
pub mod text_box;

pub use diff_view::diff_view;
pub use markdown::{highlight_code, markdown_text, render_markdown};
pub use option_list::{OptionItem, OptionList, OptionListController};
pub use spinner::{spinner_line, Spinner, SpinnerController};
pub use text_box::{TextBox, TextBoxController};
