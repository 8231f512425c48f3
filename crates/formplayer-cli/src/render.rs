use formplayer_core::interpreter::ScreenState;
use formplayer_core::notifications::Notice;
use formplayer_core::response::ScreenResponse;

pub fn render_screen(screen: ScreenState, response: Option<&ScreenResponse>) -> Vec<String> {
    let Some(response) = response else {
        return vec!["no screen loaded; run `formplayer start`".to_string()];
    };

    let mut lines = vec![
        format!("{} [{}]", response.title(), screen.label()),
        format!("  {}", response.breadcrumbs().join(" > ")),
    ];
    match (screen, response) {
        (ScreenState::AtForm, _) => {
            lines.push("form reached; form entry happens elsewhere".to_string());
        }
        (_, ScreenResponse::Commands(commands)) => {
            for (index, command) in commands.commands.iter().enumerate() {
                lines.push(format!("  {index}. {}", command.title));
            }
        }
        (_, ScreenResponse::Entities(list)) => {
            if list.entities.is_empty() {
                lines.push("  (no matching cases)".to_string());
            }
            for entity in &list.entities {
                lines.push(format!("  {}  {}", entity.id, entity.name));
            }
            if list.page_count > 1 {
                lines.push(format!(
                    "page {} of {}",
                    list.current_page + 1,
                    list.page_count
                ));
            }
        }
        (_, ScreenResponse::Query(query)) => {
            lines.push(format!("  search {}", query.query_key));
            for display in &query.displays {
                lines.push(format!("  {}=", display.id));
            }
        }
    }
    lines
}

pub fn render_notice(notice: &Notice) -> String {
    format!("[{}] {}", notice.level.label(), notice.message)
}
