//! Two machines, one queue port between them: the consumer must see exactly
//! the producer's write sequence, in order (the queue-preservation law).

use intcode_vm::ports::{QueuePort, ScriptedPort, TapePort};
use intcode_vm::Machine;
use std::thread;

#[test]
fn queue_consumer_sees_producers_exact_sequence() {
    // Producer: echoes five scripted inputs straight to its output port.
    let producer_image = vec![
        3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 99,
    ];
    let producer_input = ScriptedPort::new(vec![10, 20, 30, 40, 50]);
    let bridge = QueuePort::new(vec![]);

    // Consumer: drains five inputs into its own tape.
    let consumer_image = vec![
        3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 3, 100, 4, 100, 99,
    ];
    let consumer_output = TapePort::new();

    let mut producer = Machine::new(producer_image, producer_input, bridge.clone());
    let mut consumer = Machine::new(consumer_image, bridge, consumer_output.clone());

    let producer_thread = thread::spawn(move || producer.run_until_terminate().unwrap());
    let consumer_thread = thread::spawn(move || consumer.run_until_terminate().unwrap());

    producer_thread.join().unwrap();
    consumer_thread.join().unwrap();

    assert_eq!(consumer_output.tape(), vec![10, 20, 30, 40, 50]);
}

#[test]
fn cancellation_during_a_blocking_read_is_not_a_failure() {
    use intcode_vm::RunResult;

    // Waits on input forever (nothing ever feeds it).
    let image = vec![3, 0, 99];
    let input = QueuePort::new(vec![]);
    let output = TapePort::new();
    let mut machine = Machine::new(image, input, output);

    let cancel = machine.cancel_token();
    let handle = thread::spawn(move || machine.run_until_terminate());
    thread::sleep(std::time::Duration::from_millis(20));
    cancel.cancel();

    assert_eq!(handle.join().unwrap().unwrap(), RunResult::Cancelled);
}
