use chess::{Board, GameResult, PgnError, PgnGame, PgnReader, PgnStream, Variant, STANDARD_START_FEN};
use chrono::NaiveDate;

fn read_one(text: &str) -> PgnGame {
    let mut stream = PgnStream::from_text(text);
    let mut board = Board::default();
    PgnGame::read(&mut stream, &mut board, usize::MAX)
}

fn uci_moves(game: &PgnGame) -> Vec<String> {
    game.moves().iter().map(|mv| chess::format_uci_move(*mv)).collect()
}

mod reading {
    use super::*;

    #[test]
    fn simple_game_with_marker() {
        let game = read_one(r#"[White "A"][Black "B"][Result "1-0"] 1. e4 e5 2. Nf3 1-0"#);

        assert!(game.error().is_none());
        assert_eq!(game.white_player(), "A");
        assert_eq!(game.black_player(), "B");
        assert_eq!(uci_moves(&game), vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(game.result(), GameResult::WhiteWins);
        assert_eq!(game.starting_fen(), STANDARD_START_FEN);
    }

    #[test]
    fn fen_tag_without_moves() {
        let game = read_one(
            r#"[FEN "8/8/8/8/8/8/4K2k/8 b - - 0 1"][White "A"][Black "B"][Result "*"] *"#,
        );

        assert!(game.error().is_none());
        assert_eq!(game.starting_fen(), "8/8/8/8/8/8/4K2k/8 b - - 0 1");
        assert!(game.is_empty());
        assert_eq!(game.result(), GameResult::Unknown);
    }

    #[test]
    fn illegal_move_keeps_partial_game() {
        let game = read_one(r#"[White "A"][Black "B"][Result "0-1"] 1. e4 e5 2. Ke3 0-1"#);

        assert!(matches!(
            game.error(),
            Some(PgnError::IllegalMove { san, .. }) if san == "Ke3"
        ));
        assert_eq!(uci_moves(&game), vec!["e2e4", "e7e5"]);
        assert_eq!(game.result(), GameResult::BlackWins);
    }

    #[test]
    fn annotated_multiline_game() {
        let text = "\
[Event \"Casual\"]
[Site \"?\"]
[Date \"2024.01.01\"]
[Round \"7\"]
[White \"Morphy, Paul\"]
[Black \"Duke Karl / Count Isouard\"]
[Result \"1-0\"]

% a line escaped from the record
1. e4 e5 2. Nf3 d6 {Philidor} 3. d4 Bg4 $4 (3... exd4) 4. dxe5 Bxf3
5. Qxf3 dxe5 6. Bc4 Nf6 7. Qb3 qe7 ; wrong case is not SAN
";
        let game = read_one(text);

        assert_eq!(game.white_player(), "Morphy, Paul");
        assert_eq!(game.black_player(), "Duke Karl / Count Isouard");
        assert_eq!(game.round(), 7);
        assert_eq!(game.moves().len(), 13);
        assert!(matches!(game.error(), Some(PgnError::IllegalMove { line: 11, .. })));
    }

    #[test]
    fn chess960_game_with_shuffled_position() {
        let text = r#"[Variant "Chess960"]
[FEN "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w HFhf - 2 9"]
[White "A"]
[Black "B"]

9. g3 Nd7 *
"#;
        let game = read_one(text);

        assert!(game.error().is_none(), "{:?}", game.error());
        assert_eq!(game.variant(), Variant::Fischerandom);
        assert!(game.is_random_variant());
        assert_eq!(game.moves().len(), 2);
    }

    #[test]
    fn chess960_game_with_x_fen_castling() {
        let text = r#"[Variant "Chess960"]
[FEN "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w KQkq - 2 9"]
[White "A"]
[Black "B"]

9. g3 Nd7 *
"#;
        let game = read_one(text);

        assert!(game.error().is_none(), "{:?}", game.error());
        assert!(game.is_random_variant());
        assert_eq!(
            game.starting_fen(),
            "bqnb1rkr/pp3ppp/3ppn2/2p5/5P2/P2P4/NPP1P1PP/BQ1BNRKR w KQkq - 2 9"
        );
        assert_eq!(uci_moves(&game), vec!["g2g3", "f6d7"]);
    }

    #[test]
    fn truncated_at_move_cap() {
        let mut stream = PgnStream::from_text(r#"[White "A"] 1. e4 e5 2. Nf3 Nc6 3. Bb5 *"#);
        let mut board = Board::default();
        let game = PgnGame::read(&mut stream, &mut board, 3);

        assert!(game.is_truncated());
        assert_eq!(uci_moves(&game), vec!["e2e4", "e7e5", "g1f3"]);
    }
}

mod tolerance {
    use super::*;

    #[test]
    fn missing_marker_does_not_swallow_next_game() {
        let text = "[White \"A\"][Black \"B\"][Result \"1-0\"] 1. e4 e5\n\
                    [White \"C\"][Black \"D\"][Result \"0-1\"] 1. d4 d5 0-1";
        let mut stream = PgnStream::from_text(text);
        let mut board = Board::default();

        let first = PgnGame::read(&mut stream, &mut board, usize::MAX);
        assert_eq!(first.white_player(), "A");
        assert_eq!(first.black_player(), "B");
        assert_eq!(first.result(), GameResult::WhiteWins);
        assert_eq!(uci_moves(&first), vec!["e2e4", "e7e5"]);
        assert!(matches!(first.error(), Some(PgnError::TagAfterMoves { .. })));

        let second = PgnGame::read(&mut stream, &mut board, usize::MAX);
        assert!(second.error().is_none());
        assert_eq!(second.white_player(), "C");
        assert_eq!(second.black_player(), "D");
        assert_eq!(second.result(), GameResult::BlackWins);
        assert_eq!(uci_moves(&second), vec!["d2d4", "d7d5"]);
    }

    #[test]
    fn broken_game_is_skipped_to_next_record() {
        let text = "[White \"A\"]\n1. e4 e5 2. Ke3 Nf6 3. Nf3 1-0\n\n[White \"C\"]\n1. d4 *\n";
        let games: Vec<PgnGame> = PgnReader::from_text(text).collect();

        assert_eq!(games.len(), 2);
        assert!(games[0].error().is_some());
        assert_eq!(games[0].moves().len(), 2);
        assert!(games[1].error().is_none());
        assert_eq!(games[1].white_player(), "C");
        assert_eq!(uci_moves(&games[1]), vec!["d2d4"]);
    }

    #[test]
    fn game_with_unknown_variant_is_reported_once() {
        let text = "[Variant \"bughouse\"]\n[White \"A\"]\n[Black \"B\"]\n1. e4 *\n\n\
                    [White \"C\"]\n1. d4 *\n";
        let games: Vec<PgnGame> = PgnReader::from_text(text).collect();

        assert_eq!(games.len(), 2);
        assert!(matches!(games[0].error(), Some(PgnError::UnknownVariant { .. })));
        assert!(games[0].moves().is_empty());
        assert_eq!(games[1].white_player(), "C");
        assert_eq!(uci_moves(&games[1]), vec!["d2d4"]);
    }

    #[test]
    fn board_is_reset_between_games() {
        let text = "[White \"A\"]\n1. e4 *\n[White \"B\"]\n1. e4 *\n";
        let games: Vec<PgnGame> = PgnReader::from_text(text).collect();
        assert_eq!(games.len(), 2);
        assert!(games.iter().all(|g| g.error().is_none() && g.moves().len() == 1));
    }
}

mod round_trip {
    use super::*;

    fn rewrite(game: &PgnGame) -> String {
        let mut out = Vec::new();
        game.write_to(&mut out, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn assert_same_game(a: &PgnGame, b: &PgnGame) {
        assert_eq!(a.white_player(), b.white_player());
        assert_eq!(a.black_player(), b.black_player());
        assert_eq!(a.result(), b.result());
        assert_eq!(a.variant(), b.variant());
        assert_eq!(a.starting_fen(), b.starting_fen());
        assert_eq!(a.round(), b.round());
        assert_eq!(a.moves(), b.moves());
    }

    #[test]
    fn write_then_read_preserves_game() {
        let original = read_one(
            "[White \"A\"]\n[Black \"B\"]\n[Round \"4\"]\n[Result \"1/2-1/2\"]\n\n\
             1. d4 Nf6 2. c4 e6 3. Nc3 Bb4 4. e3 O-O 5. Bd3 d5 6. Nf3 c5 7. O-O Nc6 1/2-1/2\n",
        );
        assert!(original.error().is_none());

        let text = rewrite(&original);
        assert!(text.starts_with("[Date \"2024.05.01\"]\n[Round \"4\"]\n"));

        let reread = read_one(&text);
        assert!(reread.error().is_none(), "{:?}\n{}", reread.error(), text);
        assert_same_game(&original, &reread);
        assert_eq!(rewrite(&reread), text);
    }

    #[test]
    fn black_to_move_start_round_trips() {
        let original = read_one(
            "[FEN \"r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 3 3\"]\n\
             [White \"A\"]\n[Black \"B\"]\n\n3... Nf6 4. Nc3 *\n",
        );
        assert!(original.error().is_none());

        let text = rewrite(&original);
        assert!(text.contains("\n3... Nf6 4. Nc3 *\n"));
        assert_same_game(&original, &read_one(&text));
    }

    #[test]
    fn live_game_snapshot_round_trips_through_file() {
        let mut board = Board::default();
        for san in ["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3", "a6"] {
            let mv = board.move_from_string(san).unwrap();
            board.make_move(mv).unwrap();
        }
        let game = PgnGame::from_board("Engine A", "Engine B", &board, GameResult::Unknown);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pgn");
        game.write(&path).unwrap();

        let games: Vec<PgnGame> = PgnReader::open(&path).unwrap().collect();
        assert_eq!(games.len(), 1);
        assert_same_game(&game, &games[0]);
    }
}
