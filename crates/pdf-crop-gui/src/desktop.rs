use std::path::Path;
use std::process::Command;

/// The platform's file manager, pointed at `dir`
pub fn folder_opener(dir: &Path) -> Command {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    let mut command = Command::new(program);
    command.arg(dir);
    command
}

pub fn open_folder(dir: &Path) {
    match folder_opener(dir).spawn() {
        Ok(_) => log::info!("Opened {}", dir.display()),
        Err(e) => log::error!("Could not open {}: {}", dir.display(), e),
    }
}

/// Ask whether to open the output folder after a finished conversion
pub fn offer_to_open(dir: &Path, pages: usize) {
    let answer = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title("Conversion finished")
        .set_description(format!(
            "Saved {} pages to {}\n\nOpen the folder?",
            pages,
            dir.display()
        ))
        .set_buttons(rfd::MessageButtons::YesNo)
        .show();
    if answer == rfd::MessageDialogResult::Yes {
        open_folder(dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_opener_targets_dir() {
        let command = folder_opener(Path::new("/out/book"));
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, vec![Path::new("/out/book").as_os_str()]);

        #[cfg(target_os = "linux")]
        assert_eq!(command.get_program(), "xdg-open");
    }
}
