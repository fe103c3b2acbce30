#[cfg(test)]
mod course_scoping_tests {
    use common::hal::simulator::{
        DisplayAction, Shown, SimClock, SimControls, SimEther, SimHardware, SimRadio,
    };
    use common::ledger::LEDGER_CAPACITY;
    use common::protocol::{decode, encode, Course, Message, NodeId};
    use common::{NodeController, Radio, RadioSettings};
    use compass::{Compass, CompassMode};
    use flag::{Flag, FlagMode};

    fn course(c: char) -> Course {
        Course::new(c).unwrap()
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    type CompassRig = (NodeController<Compass>, SimHardware, SimControls);
    type FlagRig = (NodeController<Flag>, SimHardware, SimControls);

    fn compass_on(ether: &SimEther, name: &str, label: char) -> CompassRig {
        let mut hw = SimHardware::new(ether, SimClock::virtual_time());
        let controls = hw.controls();
        let mut node = NodeController::new(Compass::new(id(name), course(label)));
        node.start(&mut hw, &RadioSettings::default()).unwrap();
        // into Scan on the first tick
        controls.press_a();
        (node, hw, controls)
    }

    fn flag_on(ether: &SimEther, name: &str, labels: &str) -> FlagRig {
        let mut hw = SimHardware::new(ether, SimClock::virtual_time());
        let controls = hw.controls();
        let courses: Vec<Course> = labels.chars().map(course).collect();
        let mut node = NodeController::new(Flag::new(id(name), &courses).unwrap());
        node.start(&mut hw, &RadioSettings::default()).unwrap();
        (node, hw, controls)
    }

    /// Run one flag and one compass side by side until both clocks pass
    /// `until_ms`, always ticking the one that is behind.
    fn run_pair(
        flag: &mut FlagRig,
        compass: &mut CompassRig,
        until_ms: u64,
    ) {
        loop {
            let flag_now = flag.1.now_ms();
            let compass_now = compass.1.now_ms();
            if flag_now >= until_ms && compass_now >= until_ms {
                break;
            }
            if flag_now <= compass_now {
                flag.0.tick(&mut flag.1).unwrap();
            } else {
                compass.0.tick(&mut compass.1).unwrap();
            }
        }
    }

    fn acks(listener: &mut SimRadio) -> Vec<Message> {
        let mut seen = Vec::new();
        while let Some(frame) = listener.try_receive().unwrap() {
            if let Some(message @ Message::Ack { .. }) = decode(&frame) {
                seen.push(message);
            }
        }
        seen
    }

    #[test]
    fn test_first_encounter() {
        let ether = SimEther::new();
        let (mut compass, mut hw, _) = compass_on(&ether, "BLUE", '1');
        let mut listener = ether.join();

        listener.send(&encode(&Message::announce(course('1'), id("F1")))).unwrap();
        compass.tick(&mut hw).unwrap();

        let ledger: Vec<_> = compass
            .ledger()
            .iter_in_order()
            .map(|r| (r.course.as_char(), r.peer.as_str().to_owned()))
            .collect();
        assert_eq!(ledger, vec![('1', "F1".to_owned())]);
        assert_eq!(acks(&mut listener), vec![Message::ack(course('1'), id("BLUE"))]);
    }

    #[test]
    fn test_same_course_pair_logs_each_other() {
        let ether = SimEther::new();
        let mut flag = flag_on(&ether, "A", "12");
        let mut compass = compass_on(&ether, "BLUE", '2');

        run_pair(&mut flag, &mut compass, 5_000);

        assert!(compass.0.ledger().contains(course('2'), &id("A")));
        assert_eq!(compass.0.ledger().len(), 1);
        assert!(flag.0.ledger().contains(course('2'), &id("BLUE")));
        assert_eq!(flag.0.ledger().len(), 1);
    }

    #[test]
    fn test_unrelated_courses_never_match() {
        let ether = SimEther::new();
        let mut flag = flag_on(&ether, "A", "12");
        let mut compass = compass_on(&ether, "BLUE", '3');

        run_pair(&mut flag, &mut compass, 10_000);

        assert!(compass.0.ledger().is_empty());
        assert!(flag.0.ledger().is_empty());
    }

    #[test]
    fn test_compass_ignores_other_compass_acks() {
        let ether = SimEther::new();
        let (mut blue, mut hw, _) = compass_on(&ether, "BLUE", '1');
        let mut listener = ether.join();

        // another compass on the same course, acknowledging some flag
        for _ in 0..5 {
            listener.send(&encode(&Message::ack(course('1'), id("RED")))).unwrap();
            blue.tick(&mut hw).unwrap();
        }

        assert_eq!(*blue.mode(), CompassMode::Scan);
        assert!(blue.ledger().is_empty());
        assert!(acks(&mut listener).is_empty());
    }

    #[test]
    fn test_flag_ignores_other_flag_announcements() {
        let ether = SimEther::new();
        let (mut a, mut hw, _) = flag_on(&ether, "A", "1");
        let mut b = ether.join();

        for _ in 0..5 {
            b.send(&encode(&Message::announce(course('1'), id("B")))).unwrap();
            a.tick(&mut hw).unwrap();
        }

        assert!(a.ledger().is_empty());
    }

    #[test]
    fn test_re_encounter_is_idempotent() {
        let ether = SimEther::new();
        let (mut compass, mut hw, _) = compass_on(&ether, "BLUE", '1');
        let mut listener = ether.join();

        let mut sent = Vec::new();
        for _ in 0..10 {
            listener.send(b"F1F1").unwrap();
            compass.tick(&mut hw).unwrap();
            sent.extend(acks(&mut listener));
        }

        assert_eq!(compass.ledger().len(), 1);
        assert_eq!(sent.len(), 1);
    }

    #[test]
    fn test_full_ledger_stops_acknowledging() {
        let ether = SimEther::new();
        let (mut compass, mut hw, _) = compass_on(&ether, "BLUE", '1');
        let mut listener = ether.join();

        let mut sent = 0;
        for n in 0..LEDGER_CAPACITY + 3 {
            let flag = id(&format!("F{n}"));
            listener.send(&encode(&Message::announce(course('1'), flag))).unwrap();
            compass.tick(&mut hw).unwrap();
            sent += acks(&mut listener).len();
        }

        assert_eq!(compass.ledger().len(), LEDGER_CAPACITY);
        assert_eq!(sent, LEDGER_CAPACITY);
        assert!(!compass.ledger().contains(course('1'), &id(&format!("F{LEDGER_CAPACITY}"))));
    }

    #[test]
    fn test_replay_follows_encounter_order() {
        let ether = SimEther::new();
        let (mut compass, mut hw, controls) = compass_on(&ether, "BLUE", '1');
        let mut listener = ether.join();

        for flag in ["F3", "F1", "F2"] {
            listener.send(&encode(&Message::announce(course('1'), id(flag)))).unwrap();
            compass.tick(&mut hw).unwrap();
        }
        controls.clear_display_events();

        controls.press_b();
        while compass.ticks() < 20 && *compass.mode() != CompassMode::Navigate {
            compass.tick(&mut hw).unwrap();
        }

        let shown: Vec<String> = controls
            .display_events()
            .into_iter()
            .filter_map(|event| match event.action {
                DisplayAction::Show(Shown::Identity(peer)) => Some(peer),
                _ => None,
            })
            .collect();
        assert_eq!(shown, vec!["F3", "F1", "F2"]);
        assert_eq!(*compass.mode(), CompassMode::Navigate);
    }

    #[test]
    fn test_flag_review_of_one_course() {
        let ether = SimEther::new();
        let (mut flag, mut hw, controls) = flag_on(&ether, "A", "12");
        let mut listener = ether.join();

        for (label, visitor) in [('1', "X"), ('2', "Y"), ('1', "Z")] {
            listener.send(&encode(&Message::ack(course(label), id(visitor)))).unwrap();
            flag.tick(&mut hw).unwrap();
        }
        controls.clear_display_events();

        // into review with course "1" selected, then present it
        controls.press_a();
        flag.tick(&mut hw).unwrap();
        controls.press_a();
        while flag.ticks() < 20 && *flag.mode() != (FlagMode::Broadcast { next_course: 0 }) {
            flag.tick(&mut hw).unwrap();
        }

        let scrolled: Vec<String> = controls
            .display_events()
            .into_iter()
            .filter_map(|event| match event.action {
                DisplayAction::Scroll(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(scrolled, vec!["X", "Z"]);
    }

    #[test]
    fn test_flag_review_after_cycling_course() {
        let ether = SimEther::new();
        let (mut flag, mut hw, controls) = flag_on(&ether, "A", "12");
        let mut listener = ether.join();

        for (label, visitor) in [('1', "X"), ('2', "Y"), ('1', "Z")] {
            listener.send(&encode(&Message::ack(course(label), id(visitor)))).unwrap();
            flag.tick(&mut hw).unwrap();
        }
        controls.clear_display_events();

        controls.press_a();
        flag.tick(&mut hw).unwrap();
        controls.press_b();
        flag.tick(&mut hw).unwrap();
        controls.press_a();
        while flag.ticks() < 20 && *flag.mode() != (FlagMode::Broadcast { next_course: 0 }) {
            flag.tick(&mut hw).unwrap();
        }

        let scrolled: Vec<String> = controls
            .display_events()
            .into_iter()
            .filter_map(|event| match event.action {
                DisplayAction::Scroll(text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(scrolled, vec!["Y"]);
    }
}
