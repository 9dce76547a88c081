use ratatui::{
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::game::{
    Board, Direction, FoodColor, GameConfig, GameOverReport, GameSession, GameState, Phase,
    Position, TickClock,
};
use crate::metrics::GameMetrics;
use crate::storage::HighScoreStore;

/// Fewest terminal columns used by one board cell
pub const MIN_CELL_WIDTH: u16 = 3;
/// Rows taken by the header above the board
pub const HEADER_ROWS: u16 = 4;
/// Rows taken by the status line below the board
pub const STATUS_ROWS: u16 = 2;

const HEAD_COLOR: Color = Color::Rgb(0x1E, 0x90, 0xFF);
const BODY_COLOR: Color = Color::Rgb(0x00, 0x77, 0xFF);
const FOOD_TEXT: Color = Color::Rgb(0x05, 0x2D, 0x37);

/// Everything needed to draw one frame
pub struct Scene<'a> {
    pub state: &'a GameState,
    pub board: &'a Board,
    pub config: &'a GameConfig,
    pub high_score: u32,
    pub popup_visible: bool,
    pub screen_locked: bool,
    pub elapsed: String,
    pub games_played: u32,
    pub session_best: u32,
    /// Terminal columns per board cell
    pub cell_width: u16,
}

impl<'a> Scene<'a> {
    pub fn from_session<C: TickClock, S: HighScoreStore>(
        session: &'a GameSession<C, S>,
        metrics: &GameMetrics,
        screen_locked: bool,
        cell_width: u16,
    ) -> Self {
        Self {
            state: session.state(),
            board: session.board(),
            config: session.config(),
            high_score: session.high_score(),
            popup_visible: session.popup_visible(),
            screen_locked,
            elapsed: metrics.format_time(),
            games_played: metrics.games_played,
            session_best: metrics.session_best,
            cell_width,
        }
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, scene: &Scene) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(HEADER_ROWS), // Problem and score
                Constraint::Min(0),              // Board
                Constraint::Length(STATUS_ROWS), // Selectors and controls
            ])
            .split(frame.area());

        frame.render_widget(self.render_header(scene), chunks[0]);

        let board_area = centered(
            chunks[1],
            board_width(scene.board, scene.cell_width),
            scene.board.rows as u16 + 2,
        );
        frame.render_widget(self.render_board(scene), board_area);

        if let (true, Some(report)) = (scene.popup_visible, scene.state.game_over) {
            let popup_area = centered(board_area, 40, 9);
            frame.render_widget(Clear, popup_area);
            frame.render_widget(self.render_game_over(&report), popup_area);
        }

        frame.render_widget(self.render_status(scene), chunks[2]);
    }

    /// Shown instead of the game when the problem data could not be loaded
    pub fn render_load_error(&self, frame: &mut Frame, message: &str) {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Error loading problems",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        let widget = Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Math Snake "),
        );
        frame.render_widget(widget, frame.area());
    }

    /// Shown instead of the game when the board does not fit the terminal
    pub fn render_too_small(&self, frame: &mut Frame) {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Terminal too small",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Enlarge the window to keep playing",
                Style::default().fg(Color::Gray),
            )),
        ];

        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), frame.area());
    }

    fn render_header(&self, scene: &Scene) -> Paragraph<'_> {
        let question = match (&scene.state.problem, scene.state.phase) {
            (Some(problem), _) => format!("{} = ?", problem.question),
            (None, Phase::Idle) => "Press Enter to start".to_string(),
            (None, _) => String::new(),
        };

        let text = vec![
            Line::from(Span::styled(
                question,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    scene.state.score.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::raw("    "),
                Span::styled("High: ", Style::default().fg(Color::Yellow)),
                Span::styled(scene.high_score.to_string(), Style::default().fg(Color::White)),
                Span::raw("    "),
                Span::styled("Time: ", Style::default().fg(Color::Yellow)),
                Span::styled(scene.elapsed.clone(), Style::default().fg(Color::White)),
                Span::raw("    "),
                Span::styled("Games: ", Style::default().fg(Color::Yellow)),
                Span::styled(scene.games_played.to_string(), Style::default().fg(Color::White)),
                Span::raw("    "),
                Span::styled("Best: ", Style::default().fg(Color::Yellow)),
                Span::styled(scene.session_best.to_string(), Style::default().fg(Color::White)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_board(&self, scene: &Scene) -> Paragraph<'_> {
        let state = scene.state;
        let mut lines = Vec::with_capacity(scene.board.rows);

        for y in 0..scene.board.rows {
            let mut spans = Vec::with_capacity(scene.board.cols);

            for x in 0..scene.board.cols {
                let pos = Position::new(x as i32, y as i32);
                spans.push(self.render_cell(state, pos, scene.cell_width));
            }

            lines.push(Line::from(spans));
        }

        let title = match state.phase {
            Phase::Paused => " Math Snake · PAUSED ",
            _ => " Math Snake ",
        };

        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(HEAD_COLOR))
                .title(title),
        )
    }

    fn render_cell(&self, state: &GameState, pos: Position, width: u16) -> Span<'static> {
        if state.snake.head() == pos {
            let arrow = match state.snake.direction {
                Direction::Up => "▲",
                Direction::Down => "▼",
                Direction::Left => "◀",
                Direction::Right => "▶",
            };
            return Span::styled(
                fit_cell(arrow, width),
                Style::default()
                    .fg(Color::White)
                    .bg(HEAD_COLOR)
                    .add_modifier(Modifier::BOLD),
            );
        }

        if state.snake.occupies(pos) {
            return Span::styled(fit_cell("", width), Style::default().bg(BODY_COLOR));
        }

        if let Some(index) = state.food_at(pos) {
            let item = &state.food[index];
            return Span::styled(
                fit_cell(&item.value.to_string(), width),
                Style::default()
                    .fg(FOOD_TEXT)
                    .bg(food_color(item.color))
                    .add_modifier(Modifier::BOLD),
            );
        }

        Span::styled(fit_cell("·", width), Style::default().fg(Color::DarkGray))
    }

    fn render_game_over(&self, report: &GameOverReport) -> Paragraph<'_> {
        let mut text = vec![
            Line::from(Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("The snake {}", report.cause.describe()),
                Style::default().fg(Color::Gray),
            )),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    report.score.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
        ];

        if report.new_high_score {
            text.push(Line::from(Span::styled(
                "New high score!",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
        } else {
            text.push(Line::from(Span::styled(
                format!("High Score: {}", report.high_score),
                Style::default().fg(Color::Gray),
            )));
        }

        text.push(Line::from(""));
        text.push(Line::from(vec![
            Span::styled("R", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::styled(" restart  ", Style::default().fg(Color::Gray)),
            Span::styled("Esc", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(" back  ", Style::default().fg(Color::Gray)),
            Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(" quit", Style::default().fg(Color::Gray)),
        ]));

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_status(&self, scene: &Scene) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);
        let key = Style::default().fg(Color::Cyan);

        let text = vec![
            Line::from(vec![
                Span::styled("Type ", label),
                Span::styled(format!("[T] {}", scene.config.problem_type), value),
                Span::raw("   "),
                Span::styled("Difficulty ", label),
                Span::styled(format!("[F] {}", scene.config.difficulty), value),
                Span::raw("   "),
                Span::styled("Speed ", label),
                Span::styled(format!("[V] {}", scene.config.speed), value),
                Span::raw("   "),
                Span::styled("Screen ", label),
                Span::styled(
                    if scene.screen_locked { "[L] locked" } else { "[L] unlocked" },
                    value,
                ),
            ]),
            Line::from(vec![
                Span::styled("↑↓←→", key),
                Span::raw(" or "),
                Span::styled("WASD", key),
                Span::raw(" move | "),
                Span::styled("Enter", key),
                Span::raw(" start | "),
                Span::styled("P", key),
                Span::raw(" pause | "),
                Span::styled("R", key),
                Span::raw(" restart | "),
                Span::styled("Q", Style::default().fg(Color::Red)),
                Span::raw(" quit"),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn food_color(color: FoodColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

/// Columns per cell so that a label of `widest_label` characters keeps a gap
pub fn cell_width_for(widest_label: usize) -> u16 {
    let wanted = u16::try_from(widest_label.saturating_add(1)).unwrap_or(u16::MAX);
    wanted.max(MIN_CELL_WIDTH)
}

/// Whether the whole board, border included, fits a terminal of `cols` x `rows`
pub fn board_fits(board: &Board, cell_width: u16, cols: u16, rows: u16) -> bool {
    let needed_rows = (board.rows as u32) + 2 + u32::from(HEADER_ROWS + STATUS_ROWS);
    u32::from(board_width(board, cell_width)) <= u32::from(cols) && needed_rows <= u32::from(rows)
}

fn board_width(board: &Board, cell_width: u16) -> u16 {
    let width = (board.cols as u32) * u32::from(cell_width) + 2;
    u16::try_from(width).unwrap_or(u16::MAX)
}

/// Center a value in a cell of `width` columns; longer text is kept whole
fn fit_cell(text: &str, width: u16) -> String {
    format!("{:^width$}", text, width = usize::from(width))
}

/// A rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Answer, FoodItem, GameOverCause, Problem, Snake};
    use ratatui::{backend::TestBackend, Terminal};

    fn draw(scene: &Scene) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| Renderer::new().render(frame, scene))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn running_state() -> GameState {
        let mut state = GameState::new(Snake::new(Position::new(5, 5), Direction::Right, 2));
        state.phase = Phase::Running;
        state.score = 3;
        state.problem = Some(Problem::new("6 × 7", Answer(42.0), vec![Answer(42.0)]));
        state.food = vec![FoodItem {
            position: Position::new(8, 2),
            value: Answer(42.0),
            is_correct: true,
            color: FoodColor::Neon,
        }];
        state
    }

    fn scene<'a>(state: &'a GameState, board: &'a Board, config: &'a GameConfig) -> Scene<'a> {
        Scene {
            state,
            board,
            config,
            high_score: 11,
            popup_visible: false,
            screen_locked: false,
            elapsed: "01:02".to_string(),
            games_played: 2,
            session_best: 5,
            cell_width: MIN_CELL_WIDTH,
        }
    }

    #[test]
    fn test_header_shows_problem_and_scores() {
        let state = running_state();
        let board = Board::new(20, 18, 12);
        let config = GameConfig::default();

        let screen = draw(&scene(&state, &board, &config));

        assert!(screen.contains("6 × 7 = ?"));
        assert!(screen.contains("Score: 3"));
        assert!(screen.contains("High: 11"));
        assert!(screen.contains("Time: 01:02"));
        assert!(screen.contains("Games: 2"));
        assert!(screen.contains("Best: 5"));
        assert!(screen.contains("[T] mixed"));
    }

    #[test]
    fn test_board_shows_snake_and_food() {
        let state = running_state();
        let board = Board::new(20, 18, 12);
        let config = GameConfig::default();

        let screen = draw(&scene(&state, &board, &config));

        assert!(screen.contains(" ▶ "));
        assert!(screen.contains(" 42"));
    }

    #[test]
    fn test_idle_prompt() {
        let state = GameState::new(Snake::new(Position::new(5, 5), Direction::Right, 1));
        let board = Board::new(12, 16, 10);
        let config = GameConfig::default();

        let screen = draw(&scene(&state, &board, &config));
        assert!(screen.contains("Press Enter to start"));
    }

    #[test]
    fn test_paused_title() {
        let mut state = running_state();
        state.phase = Phase::Paused;
        let board = Board::new(20, 18, 12);
        let config = GameConfig::default();

        let screen = draw(&scene(&state, &board, &config));
        assert!(screen.contains("PAUSED"));
    }

    #[test]
    fn test_game_over_popup() {
        let mut state = running_state();
        state.phase = Phase::GameOver;
        state.game_over = Some(GameOverReport {
            score: 3,
            high_score: 11,
            new_high_score: false,
            cause: GameOverCause::WrongAnswer,
        });
        let board = Board::new(20, 18, 12);
        let config = GameConfig::default();

        let mut visible = scene(&state, &board, &config);
        visible.popup_visible = true;
        let screen = draw(&visible);
        assert!(screen.contains("GAME OVER"));
        assert!(screen.contains("Final Score: 3"));
        assert!(screen.contains("ate a wrong answer"));

        // Dismissed popup leaves the board visible
        let screen = draw(&scene(&state, &board, &config));
        assert!(!screen.contains("GAME OVER"));
    }

    #[test]
    fn test_load_error_screen() {
        let backend = TestBackend::new(80, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| Renderer::new().render_load_error(frame, "file not found"))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Error loading problems"));
        assert!(screen.contains("file not found"));
    }

    #[test]
    fn test_four_digit_values_are_shown_whole() {
        let mut state = running_state();
        state.food = vec![
            FoodItem {
                position: Position::new(2, 3),
                value: Answer(1188.0),
                is_correct: true,
                color: FoodColor::Neon,
            },
            FoodItem {
                position: Position::new(3, 3),
                value: Answer(1185.0),
                is_correct: false,
                color: FoodColor::Orange,
            },
        ];
        let board = Board::new(20, 18, 12);
        let config = GameConfig::default();

        let mut wide = scene(&state, &board, &config);
        wide.cell_width = cell_width_for(4);
        let screen = draw(&wide);

        assert!(screen.contains("1188"));
        assert!(screen.contains("1185"));
    }

    #[test]
    fn test_fit_cell() {
        assert_eq!(fit_cell("7", 3), " 7 ");
        assert_eq!(fit_cell("42", 3), "42 ");
        assert_eq!(fit_cell("-12", 3), "-12");
        assert_eq!(fit_cell("1188", 5), "1188 ");
        assert_eq!(fit_cell("12345", 3), "12345");
        assert_eq!(fit_cell("", 4), "    ");
    }

    #[test]
    fn test_cell_width_for() {
        assert_eq!(cell_width_for(1), MIN_CELL_WIDTH);
        assert_eq!(cell_width_for(2), 3);
        assert_eq!(cell_width_for(4), 5);
    }

    #[test]
    fn test_board_fits() {
        let medium = Board::new(20, 18, 12);
        let narrow = Board::new(12, 16, 12);

        assert!(!board_fits(&medium, 3, 80, 24));
        assert!(board_fits(&narrow, 3, 80, 24));
        assert!(board_fits(&medium, 3, 80, 26));
        assert!(!board_fits(&medium, 5, 80, 40));
    }

    #[test]
    fn test_too_small_screen() {
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| Renderer::new().render_too_small(frame))
            .unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(screen.contains("Terminal too small"));
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let area = Rect::new(0, 0, 10, 5);
        assert_eq!(centered(area, 4, 3), Rect::new(3, 1, 4, 3));
        assert_eq!(centered(area, 40, 30), area);
    }
}
