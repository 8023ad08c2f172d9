use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::files::RECOGNISED_EXTENSIONS;

/// Blocking OS dialogs. `None` means the user cancelled.
pub trait Dialogs {
    fn open_file(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
    fn open_folder(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
    fn save_file(&mut self, start_dir: Option<&Path>, file_name: &str) -> Option<PathBuf>;
    fn warn(&mut self, title: &str, message: &str);
}

pub struct NativeDialogs;

fn with_start(dialog: FileDialog, start_dir: Option<&Path>) -> FileDialog {
    match start_dir {
        Some(dir) => dialog.set_directory(dir),
        None => dialog,
    }
}

fn supported_filter() -> Vec<&'static str> {
    RECOGNISED_EXTENSIONS
        .iter()
        .map(|e| e.trim_start_matches('.'))
        .collect()
}

impl Dialogs for NativeDialogs {
    fn open_file(&mut self, start_dir: Option<&Path>) -> Option<PathBuf> {
        with_start(FileDialog::new().set_title("Open Image"), start_dir)
            .add_filter("Supported images", &supported_filter())
            .add_filter("All files", &["*"])
            .pick_file()
    }

    fn open_folder(&mut self, start_dir: Option<&Path>) -> Option<PathBuf> {
        with_start(FileDialog::new().set_title("Open Folder"), start_dir).pick_folder()
    }

    fn save_file(&mut self, start_dir: Option<&Path>, file_name: &str) -> Option<PathBuf> {
        with_start(FileDialog::new().set_title("Save Image As"), start_dir)
            .set_file_name(file_name)
            .save_file()
    }

    fn warn(&mut self, title: &str, message: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}
