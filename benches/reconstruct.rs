//! Benchmarks for the reconstruction pipeline.
//!
//! Measures the full fixed-order pipeline over fabricated classes whose method bodies
//! repeat the recognized idioms (chained assignments, increments, split constructions),
//! plus the no-match case of a body the passes only scan.

#![allow(unused)]
extern crate jarscope;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use jarscope::prelude::*;
use std::hint::black_box;

fn node(offset: u32, line: u16, kind: InstructionKind) -> Instruction {
    Instruction::new(offset, Some(line), kind)
}

fn local_load(offset: u32, line: u16, index: u16) -> Instruction {
    node(offset, line, InstructionKind::LocalLoad { index })
}

fn local_store(offset: u32, line: u16, index: u16, value: Instruction) -> Instruction {
    node(
        offset,
        line,
        InstructionKind::LocalStore {
            index,
            value: Box::new(value),
        },
    )
}

fn dup_store(offset: u32, line: u16, temp: TempId, value: Instruction) -> Instruction {
    node(
        offset,
        line,
        InstructionKind::DupStore {
            temp,
            value: Box::new(value),
        },
    )
}

fn dup_load(offset: u32, line: u16, temp: TempId) -> Instruction {
    node(offset, line, InstructionKind::DupLoad { temp })
}

fn int(offset: u32, line: u16, value: i32) -> Instruction {
    node(offset, line, InstructionKind::Const(ConstValue::Int(value)))
}

/// A method body repeating three idioms `repeats` times.
fn idiom_body(class: &mut ClassModel, repeats: u32) -> Vec<Instruction> {
    let foo = class.pool.add_class("pkg/Foo");
    let init = class.pool.add_method_ref("pkg/Foo", "<init>", "()V");

    let mut body = Vec::new();
    let mut offset = 0;
    for n in 0..repeats {
        let line = (n + 1) as u16;
        let temp_base = n * 3;
        // a = b = n
        body.push(dup_store(offset, line, temp_base, int(offset, line, n as i32)));
        body.push(local_store(offset + 1, line, 1, dup_load(offset + 1, line, temp_base)));
        body.push(local_store(offset + 2, line, 2, dup_load(offset + 2, line, temp_base)));
        // c = x++
        body.push(dup_store(offset + 3, line, temp_base + 1, local_load(offset + 3, line, 3)));
        body.push(local_store(
            offset + 4,
            line,
            3,
            node(
                offset + 4,
                line,
                InstructionKind::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(dup_load(offset + 4, line, temp_base + 1)),
                    right: Box::new(int(offset + 4, line, 1)),
                },
            ),
        ));
        body.push(local_store(offset + 5, line, 4, dup_load(offset + 5, line, temp_base + 1)));
        // d = new Foo()
        body.push(dup_store(
            offset + 6,
            line,
            temp_base + 2,
            node(offset + 6, line, InstructionKind::New { class: foo }),
        ));
        body.push(node(
            offset + 7,
            line,
            InstructionKind::Invoke {
                kind: InvokeKind::Special,
                method: init,
                object: Some(Box::new(dup_load(offset + 7, line, temp_base + 2))),
                args: vec![],
            },
        ));
        body.push(local_store(offset + 8, line, 5, dup_load(offset + 8, line, temp_base + 2)));
        offset += 9;
    }
    body
}

/// A body with nothing to rewrite, to measure pure scan cost.
fn plain_body(length: u32) -> Vec<Instruction> {
    (0..length)
        .map(|n| local_store(n, 1, 1, int(n, 1, n as i32)))
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let reconstructor = Reconstructor::new();

    let mut group = c.benchmark_group("pipeline_idioms");
    for repeats in [10u32, 100] {
        group.throughput(Throughput::Elements(u64::from(repeats) * 3));
        group.bench_function(format!("repeats_{repeats}"), |b| {
            b.iter_batched(
                || {
                    let mut class = ClassModel::new("pkg/Bench");
                    let method = class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
                    class.methods[method].body = idiom_body(&mut class, repeats);
                    class
                },
                |mut class| {
                    let summary = reconstructor.run(&mut class).unwrap();
                    black_box(summary)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();

    let mut group = c.benchmark_group("pipeline_no_match");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("scan_1000", |b| {
        b.iter_batched(
            || {
                let mut class = ClassModel::new("pkg/Bench");
                let method = class.add_method("m", "()V", MethodAccessFlags::PUBLIC);
                class.methods[method].body = plain_body(1000);
                class
            },
            |mut class| {
                let summary = reconstructor.run(&mut class).unwrap();
                black_box(summary)
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
