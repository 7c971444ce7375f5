use chrono::Local;
use ratatui::style::{Modifier, Style};
use unicode_width::UnicodeWidthStr;

use crate::app::AppContext;
use crate::domain::Item;
use crate::store::Store;
use crate::tui::app::TuiApp;
use crate::tui::pane::{Pane, PaneError};
use crate::tui::screen::{fit, Screen};

/// Columns kept for the date at the end of an item row.
const DATE_WIDTH: usize = 16;

/// Rewrite the panes whose state changed since the last pass. The caller
/// blits the screen afterwards.
pub async fn render(app: &mut TuiApp, screen: &mut Screen, ctx: &AppContext) {
    if app.redraw_feeds {
        draw_feeds(app, &mut screen.sidebar, ctx);
        app.redraw_feeds = false;
    }

    if app.redraw_content {
        draw_content(app, &mut screen.content, ctx).await;
        app.redraw_content = false;
    }

    if app.log.take_changed() {
        app.log.write_to(&mut screen.messages);
    }
}

fn draw_feeds(app: &mut TuiApp, pane: &mut Pane, ctx: &AppContext) {
    pane.clear();
    let width = pane.width();

    for (i, feed) in app.feeds.iter().enumerate() {
        let mut name = feed.name.clone();
        if ctx.config.unread_count {
            match ctx.store.feed_counts(feed.id) {
                Ok(counts) => {
                    name.push_str(&format!(" ({}", counts.unread));
                    if counts.starred > 0 {
                        name.push_str(&format!(", *{}", counts.starred));
                    }
                    name.push(')');
                }
                Err(e) => {
                    tracing::error!(feed = feed.id, error = %e, "could not count items");
                    app.log.push(format!("Unable to count items of {}: {}", feed.name, e));
                }
            }
        }

        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if i == app.feed_index {
            style = style.add_modifier(Modifier::REVERSED);
        }
        skip_pane_error(pane.write(&fit(&name, width), Some(i), 0, style));
    }

    pane.reveal(app.feed_index);
}

async fn draw_content(app: &mut TuiApp, pane: &mut Pane, ctx: &AppContext) {
    pane.clear();
    let width = pane.width();

    let article = if app.item_open {
        app.rendered_content(ctx, width).await.map(str::to_string)
    } else {
        None
    };

    for (i, item) in app.items.iter().enumerate() {
        let selected = i == app.item_index;

        let mut style = Style::default();
        if selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        if !item.read {
            style = style.add_modifier(Modifier::BOLD);
        }

        skip_pane_error(pane.write(&item_row(item, width), None, 0, style));

        if selected {
            if app.autoscroll_to_item {
                pane.reveal(pane.cursor().saturating_sub(1));
                app.autoscroll_to_item = false;
            }
            if let Some(article) = &article {
                skip_pane_error(pane.write("", None, 0, Style::default()));
                skip_pane_error(pane.write(article, None, 0, Style::default()));
            }
        }
    }

    pane.constrain_scroll(None, None);
}

/// Title, starred marker and date of one item, exactly `width` columns.
fn item_row(item: &Item, width: usize) -> String {
    let mut title = String::new();
    if item.starred {
        title.push('*');
    }
    title.push_str(item.display_title());

    if title.width() + DATE_WIDTH < width {
        let date = item.date.with_timezone(&Local).format("%Y-%m-%d %H:%M");
        format!("{}{}", fit(&title, width - DATE_WIDTH), date)
    } else {
        fit(&title, width)
    }
}

fn skip_pane_error(result: std::result::Result<usize, PaneError>) {
    if let Err(e) = result {
        tracing::trace!(error = %e, "pane write skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ratatui::buffer::Buffer;
    use ratatui::layout::{Rect, Size};

    use crate::tui::app::tests::{fixture, screen};
    use crate::tui::event::Action;

    fn item(title: &str, starred: bool) -> Item {
        Item {
            id: 1,
            feed_id: 1,
            guid: "g".into(),
            title: title.into(),
            url: String::new(),
            date: Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap(),
            content: String::new(),
            read: false,
            starred,
        }
    }

    #[test]
    fn test_item_row_with_date() {
        let row = item_row(&item("Hello", true), 40);
        let date = Utc
            .with_ymd_and_hms(2024, 1, 2, 12, 0, 0)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();

        assert_eq!(row.width(), 40);
        assert!(row.starts_with("*Hello "));
        assert!(row.ends_with(&date));
    }

    #[test]
    fn test_item_row_without_room_for_date() {
        let row = item_row(&item("A rather long title", false), 20);
        assert_eq!(row, "A rather long title ");

        let clipped = item_row(&item("A rather long title", false), 10);
        assert_eq!(clipped, "A rather l");
    }

    #[tokio::test]
    async fn test_render_pass_clears_flags_and_writes_rows() {
        let (_, ctx, _) = fixture();
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();

        render(&mut app, &mut screen, &ctx).await;

        assert!(!app.redraw_feeds && !app.redraw_content);
        assert!(screen.sidebar.line_text(0).unwrap().starts_with("A "));
        assert!(screen.sidebar.line_text(1).unwrap().starts_with("B "));
        assert!(screen.content.line_text(0).unwrap().starts_with("Second"));
        assert!(screen.content.line_text(1).unwrap().starts_with("First"));
        assert_eq!(screen.content.content_len(), 2);

        let selected = screen.sidebar.style_at(0, 0).unwrap();
        assert!(selected.add_modifier.contains(Modifier::REVERSED));
        let other = screen.content.style_at(1, 0).unwrap();
        assert!(other.add_modifier.contains(Modifier::BOLD));
        assert!(!other.add_modifier.contains(Modifier::REVERSED));
        assert!(screen.messages.content_len() > 0);
    }

    #[tokio::test]
    async fn test_open_item_shows_article_below_title() {
        let (_, ctx, _) = fixture();
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();

        app.handle_action(Action::Open, &ctx, &mut screen).await;
        render(&mut app, &mut screen, &ctx).await;

        assert!(screen.content.line_text(0).unwrap().starts_with("Second"));
        assert_eq!(screen.content.line_text(1).unwrap().trim(), "");
        let text: Vec<String> = (2..screen.content.content_len())
            .filter_map(|row| screen.content.line_text(row))
            .collect();
        assert!(text.iter().any(|l| l.contains("Second")));
        assert!(text.last().unwrap().starts_with("First"));

        // Read items are no longer bold
        let opened = screen.content.style_at(0, 0).unwrap();
        assert!(!opened.add_modifier.contains(Modifier::BOLD));
    }

    #[tokio::test]
    async fn test_unread_counts_in_sidebar() {
        let (_, mut ctx, _) = fixture();
        ctx.config.unread_count = true;
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();

        app.handle_action(Action::ToggleStar, &ctx, &mut screen).await;
        render(&mut app, &mut screen, &ctx).await;

        assert!(screen.sidebar.line_text(0).unwrap().starts_with("A (2, *1)"));
        assert!(screen.sidebar.line_text(1).unwrap().starts_with("B (0)"));
    }

    #[tokio::test]
    async fn test_count_failure_is_logged_and_name_still_drawn() {
        let (_, mut ctx, _) = fixture();
        ctx.config.unread_count = true;
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();
        ctx.store.execute_batch("DROP TABLE items").unwrap();

        render(&mut app, &mut screen, &ctx).await;

        let row = screen.sidebar.line_text(0).unwrap();
        assert!(row.starts_with("A "));
        assert!(!row.contains('('));
        assert!(app.log.entries().any(|m| m.contains("Unable to count items of A")));
        assert!(screen.content.line_text(0).unwrap().starts_with("Second"));
    }

    #[tokio::test]
    async fn test_autoscroll_reveals_selection() {
        let (_, ctx, _) = fixture();
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();

        // Pad the list so the selection can fall outside the viewport
        let template = app.items[1].clone();
        for n in 0..40 {
            let mut extra = template.clone();
            extra.title = format!("Extra {n}");
            app.items.push(extra);
        }
        app.item_index = 30;
        app.autoscroll_to_item = true;

        render(&mut app, &mut screen, &ctx).await;

        let height = screen.content.height();
        let scroll = screen.content.scroll();
        assert!(!app.autoscroll_to_item);
        assert!(scroll <= 30 && 30 < scroll + height);
    }

    #[tokio::test]
    async fn test_resize_then_render_fits_new_geometry() {
        let (_, ctx, _) = fixture();
        let mut app = TuiApp::new();
        app.start(&ctx).await.unwrap();
        let mut screen = screen();
        render(&mut app, &mut screen, &ctx).await;

        let small = Size::new(30, 10);
        app.resize(&mut screen, small);
        render(&mut app, &mut screen, &ctx).await;

        let width = screen.content.width();
        for row in 0..screen.content.content_len() {
            assert!(screen.content.line_text(row).unwrap().width() <= width);
        }
        let mut buf = Buffer::empty(Rect::new(0, 0, small.width, small.height));
        screen.blit(&mut buf);
    }
}
