//! End-to-end scenarios for the blocking runtime.
//!
//! Each test spawns real actors on real threads and observes them from the
//! outside through an mpsc channel; assertions never run inside actor
//! bodies, where a failed assertion would be swallowed by the panic-to-
//! exit-reason conversion.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use strand_rt::prelude::*;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn new_system() -> ActorSystem {
    ActorSystem::new(SystemConfig::default()).unwrap()
}

// ============================================================================
// Scenario: echo over a synchronous request
// ============================================================================

#[test]
fn test_echo_sync_send() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let echo = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive(Behavior::new().on(|ctx: &mut ReceiveContext<'_>, x: i64| {
                ctx.reply(x + 1);
            }))
        })
        .unwrap();

    let echo_addr = echo.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let handle = actor.sync_send(&echo_addr, 41i64).unwrap();
            handle.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, answer: i64| {
                let _ = tx.send(answer);
            }))
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_millis(100)), Ok(42));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: timeout wins the response race
// ============================================================================

#[test]
fn test_timed_sync_send_timeout_wins() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<&'static str>();

    // The server never replies; it only knows how to stop.
    let server = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive(
                Behavior::new().on_atom(atom("stop"), |ctx| ctx.quit(ExitReason::NORMAL)),
            )
        })
        .unwrap();

    let server_addr = server.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let handle = actor
                .timed_sync_send(&server_addr, Duration::from_millis(10), (atom("ping"),))
                .unwrap();
            let outcome_tx = tx.clone();
            let response_tx = tx.clone();
            handle.receive(
                Behavior::new()
                    .on(move |_ctx: &mut ReceiveContext<'_>, _timeout: SyncTimeoutMsg| {
                        let _ = outcome_tx.send("timeout");
                    })
                    .catch_all(move |_ctx, _msg| {
                        let _ = response_tx.send("response");
                    }),
            )?;
            let _ = tx.send("alive");
            Ok(())
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok("timeout"));
    // The requester keeps running after the timeout resolution.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok("alive"));
    server.tell((atom("stop"),));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: a real response beats a generous timeout
// ============================================================================

#[test]
fn test_timed_sync_send_response_wins() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let echo = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive(Behavior::new().on(|ctx: &mut ReceiveContext<'_>, x: i64| {
                ctx.reply(x * 2);
            }))
        })
        .unwrap();

    let echo_addr = echo.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let handle = actor
                .timed_sync_send(&echo_addr, Duration::from_millis(500), 21i64)
                .unwrap();
            let response_tx = tx.clone();
            handle.receive(
                Behavior::new()
                    .on(move |_ctx: &mut ReceiveContext<'_>, answer: i64| {
                        let _ = response_tx.send(answer);
                    })
                    .on(|_ctx: &mut ReceiveContext<'_>, _timeout: SyncTimeoutMsg| {}),
            )?;
            // The losing timeout notification must be dropped silently: a
            // later receive only sees its own timeout clause fire.
            let quiet_tx = tx.clone();
            actor.receive(
                Behavior::new()
                    .catch_all(move |_ctx, _msg| {
                        let _ = quiet_tx.send(-1);
                    })
                    .after(Duration::from_millis(600), move |_ctx| {
                        let _ = tx.send(-2);
                    }),
            )
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(42));
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(-2));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: high priority preempts a full mailbox
// ============================================================================

#[test]
fn test_priority_preemption() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<String>();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();

    let receiver = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            // Hold off dequeuing until the producer finished enqueuing.
            let _ = gate_rx.recv();
            let first_tx = tx.clone();
            actor.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, s: String| {
                let _ = first_tx.send(s);
            }))?;
            // Drain the normal-priority backlog.
            let mut drained = 0;
            actor.receive_for(
                &mut drained,
                1000,
                Behavior::new().on(|_ctx: &mut ReceiveContext<'_>, _x: i64| {}),
            )
        })
        .unwrap();

    for i in 0..1000i64 {
        receiver.tell(i);
    }
    receiver.tell_with_priority(MessagePriority::High, "HI");
    gate_tx.send(()).unwrap();

    // The single high-priority envelope is dequeued first.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok("HI".to_owned()));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: a monitor fires exactly once, demonitor suppresses
// ============================================================================

#[test]
fn test_monitor_fires_exactly_once() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<Option<(ActorId, ExitReason)>>();

    let observed = system
        .spawn(|actor: &mut BlockingActor| -> ActorResult<()> {
            actor.receive(Behavior::new().on_atom(atom("die"), |ctx| {
                ctx.quit(ExitReason::user(7));
            }))
        })
        .unwrap();

    let observed_addr = observed.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.monitor(&observed_addr);
            actor.send(&observed_addr, (atom("die"),));
            let down_tx = tx.clone();
            actor.receive(Behavior::new().on(
                move |_ctx: &mut ReceiveContext<'_>, down: DownMsg| {
                    let _ = down_tx.send(Some((down.source.id(), down.reason)));
                },
            ))?;
            // No second notification may ever arrive.
            let second_tx = tx.clone();
            actor.receive(
                Behavior::new()
                    .on(move |_ctx: &mut ReceiveContext<'_>, down: DownMsg| {
                        let _ = second_tx.send(Some((down.source.id(), down.reason)));
                    })
                    .after(Duration::from_millis(100), move |_ctx| {
                        let _ = tx.send(None);
                    }),
            )
        })
        .unwrap();

    assert_eq!(
        rx.recv_timeout(RECV_TIMEOUT),
        Ok(Some((observed.id(), ExitReason::user(7))))
    );
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(None));
    system.await_all_actors_done();
}

#[test]
fn test_demonitor_suppresses_down_message() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<Option<DownMsg>>();

    let observed = system
        .spawn(|actor: &mut BlockingActor| -> ActorResult<()> {
            actor.receive(Behavior::new().on_atom(atom("die"), |ctx| {
                ctx.quit(ExitReason::user(7));
            }))
        })
        .unwrap();

    let observed_addr = observed.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.monitor(&observed_addr);
            actor.demonitor(&observed_addr);
            actor.send(&observed_addr, (atom("die"),));
            let down_tx = tx.clone();
            actor.receive(
                Behavior::new()
                    .on(move |_ctx: &mut ReceiveContext<'_>, down: DownMsg| {
                        let _ = down_tx.send(Some(down));
                    })
                    .after(Duration::from_millis(100), move |_ctx| {
                        let _ = tx.send(None);
                    }),
            )
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap().map(|d| d.reason), None);
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: receive_for counts and leaves the surplus queued
// ============================================================================

#[test]
fn test_receive_for_counts_to_end() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let counter = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let mut i = 0;
            let each_tx = tx.clone();
            actor.receive_for(
                &mut i,
                10,
                Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, x: i64| {
                    let _ = each_tx.send(x);
                }),
            )?;
            assert_eq!(i, 10);
            // The eleventh message is still queued.
            actor.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, x: i64| {
                let _ = tx.send(1000 + x);
            }))
        })
        .unwrap();

    for i in 0..11i64 {
        counter.tell(i);
    }
    for i in 0..10i64 {
        assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(i));
    }
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(1010));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: receive_while stops when the predicate fails
// ============================================================================

#[test]
fn test_receive_while_checks_before_each_iteration() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let running_total = Arc::new(AtomicUsize::new(0));
    let handler_total = Arc::clone(&running_total);
    let pred_total = Arc::clone(&running_total);

    let consumer = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let each_tx = tx.clone();
            actor.receive_while(
                move || pred_total.load(Ordering::SeqCst) < 25,
                Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, x: i64| {
                    handler_total.fetch_add(x as usize, Ordering::SeqCst);
                    let _ = each_tx.send(x);
                }),
            )?;
            let _ = tx.send(-1);
            Ok(())
        })
        .unwrap();

    // 10 + 15 crosses the bound; the third message stays queued.
    for x in [10i64, 15, 99] {
        consumer.tell(x);
    }
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(10));
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(15));
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(-1));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: do_receive consumes until the predicate holds
// ============================================================================

#[test]
fn test_do_receive_until() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<usize>();

    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = Arc::clone(&count);
    let pred_count = Arc::clone(&count);

    let consumer = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor
                .do_receive(Behavior::new().on(
                    move |_ctx: &mut ReceiveContext<'_>, _x: i64| {
                        handler_count.fetch_add(1, Ordering::SeqCst);
                    },
                ))
                .until(move || pred_count.load(Ordering::SeqCst) >= 3)?;
            let _ = tx.send(count.load(Ordering::SeqCst));
            Ok(())
        })
        .unwrap();

    for i in 0..5i64 {
        consumer.tell(i);
    }
    // Exactly three messages were consumed when the predicate first held.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(3));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: await-all-other-actors-done
// ============================================================================

#[test]
fn test_await_all_other_actors_done() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<&'static str>();

    for _ in 0..4 {
        system
            .spawn(|actor: &mut BlockingActor| {
                actor.receive(
                    Behavior::new()
                        .on(|_ctx: &mut ReceiveContext<'_>, _x: i64| {})
                        .after(Duration::from_millis(30), |_ctx| {}),
                )
            })
            .unwrap();
    }

    system
        .spawn(move |actor: &mut BlockingActor| {
            actor.await_all_other_actors_done();
            let _ = tx.send("all done");
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok("all done"));
    system.await_all_actors_done();
    assert_eq!(system.running_actors(), 0);
}

// ============================================================================
// Scenario: forwarding preserves the requester
// ============================================================================

#[test]
fn test_forward_preserves_sender_and_correlation() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let worker = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive(Behavior::new().on(|ctx: &mut ReceiveContext<'_>, x: i64| {
                ctx.reply(x * 2);
            }))
        })
        .unwrap();

    let worker_addr = worker.address();
    let dispatcher = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.receive(Behavior::new().on(move |ctx: &mut ReceiveContext<'_>, _x: i64| {
                ctx.forward_to(&worker_addr, MessagePriority::Normal);
                // The envelope is consumed; there is no current message now.
                assert!(ctx.message().is_err());
            }))
        })
        .unwrap();

    let dispatcher_addr = dispatcher.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let handle = actor.sync_send(&dispatcher_addr, 7i64).unwrap();
            handle.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, answer: i64| {
                let _ = tx.send(answer);
            }))
        })
        .unwrap();

    // The worker's reply reaches the original requester.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(14));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: response promises outlive the handler
// ============================================================================

#[test]
fn test_response_promise_fulfilled_from_other_thread() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let deferred = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive(Behavior::new().on(|ctx: &mut ReceiveContext<'_>, x: i64| {
                let promise = ctx.make_response_promise();
                std::thread::spawn(move || {
                    std::thread::sleep(Duration::from_millis(20));
                    promise.deliver(x + 100);
                });
            }))
        })
        .unwrap();

    let deferred_addr = deferred.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let handle = actor.sync_send(&deferred_addr, 1i64).unwrap();
            handle.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, answer: i64| {
                let _ = tx.send(answer);
            }))
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(101));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: links propagate abnormal exits
// ============================================================================

#[test]
fn test_link_propagates_abnormal_exit() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<ExitReason>();

    // The victim just waits for messages; it never traps exits.
    let victim = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive_loop(Behavior::new().on(|_ctx: &mut ReceiveContext<'_>, _x: i64| {}))
        })
        .unwrap();

    let victim_addr = victim.address();
    let crasher = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.link_to(&victim_addr);
            actor.receive(Behavior::new().on_atom(atom("crash"), |ctx| {
                ctx.quit(ExitReason::user(9));
            }))
        })
        .unwrap();

    // Observe the victim so its death is visible out here.
    let victim_addr = victim.address();
    let crasher_addr = crasher.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.monitor(&victim_addr);
            actor.send(&crasher_addr, (atom("crash"),));
            actor.receive(Behavior::new().on(
                move |_ctx: &mut ReceiveContext<'_>, down: DownMsg| {
                    let _ = tx.send(down.reason);
                },
            ))
        })
        .unwrap();

    // The linked victim died with the crasher's reason.
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(ExitReason::user(9)));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: send_exit demands an exit, high priority
// ============================================================================

#[test]
fn test_send_exit_terminates_untrapping_actor() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<ExitReason>();

    let victim = system
        .spawn(|actor: &mut BlockingActor| {
            actor.receive_loop(Behavior::new().on(|_ctx: &mut ReceiveContext<'_>, _x: i64| {}))
        })
        .unwrap();

    let victim_addr = victim.address();
    system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.monitor(&victim_addr);
            actor.send_exit(&victim_addr, ExitReason::USER_SHUTDOWN);
            actor.receive(Behavior::new().on(
                move |_ctx: &mut ReceiveContext<'_>, down: DownMsg| {
                    let _ = tx.send(down.reason);
                },
            ))
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(ExitReason::USER_SHUTDOWN));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: trapped exits are ordinary messages
// ============================================================================

#[test]
fn test_trapped_exit_runs_handler_instead_of_dying() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<ExitReason>();

    let trapper = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            actor.receive(Behavior::new().on(
                move |_ctx: &mut ReceiveContext<'_>, exit: ExitMsg| {
                    let _ = tx.send(exit.reason);
                },
            ))
        })
        .unwrap();

    let trapper_addr = trapper.address();
    system
        .spawn(move |actor: &mut BlockingActor| {
            actor.send_exit(&trapper_addr, ExitReason::user(3));
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(ExitReason::user(3)));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: delayed send arrives after the delay
// ============================================================================

#[test]
fn test_delayed_send_delivers_later() {
    let system = new_system();
    let (tx, rx) = mpsc::channel::<i64>();

    let target = system
        .spawn(move |actor: &mut BlockingActor| -> ActorResult<()> {
            let when = std::time::Instant::now();
            actor.receive(Behavior::new().on(move |_ctx: &mut ReceiveContext<'_>, x: i64| {
                assert!(when.elapsed() >= Duration::from_millis(20));
                let _ = tx.send(x);
            }))
        })
        .unwrap();

    let target_addr = target.address();
    system
        .spawn(move |actor: &mut BlockingActor| {
            actor.delayed_send(Duration::from_millis(25), &target_addr, 5i64);
        })
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(5));
    system.await_all_actors_done();
}

// ============================================================================
// Scenario: dead addresses stop resolving
// ============================================================================

#[test]
fn test_address_of_finished_actor_does_not_upgrade() {
    let system = new_system();
    let actor = system.spawn(|| {}).unwrap();
    let address = actor.address();
    system.await_all_actors_done();

    assert!(actor.is_terminated());
    assert!(address.upgrade().is_none());
    // Requests against it fail fast; async sends simply drop.
    let (tx, rx) = mpsc::channel::<bool>();
    system
        .spawn(move |client: &mut BlockingActor| {
            let outcome = client.sync_send(&address, 1i64);
            let _ = tx.send(matches!(outcome, Err(ActorError::InvalidTarget)));
        })
        .unwrap();
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT), Ok(true));
    system.await_all_actors_done();
}
