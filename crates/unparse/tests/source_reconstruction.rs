// Copyright (C) 2025 the pysrc authors. This program is free software: you
// can redistribute it and/or modify it under the terms of the GNU General
// Public License as published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! End-to-end reconstruction of complete programs, one per end of the
//! dialect chain.

use pretty_assertions::assert_eq;
use pysrc_unparse::ast::{Node, Signature, Singleton, Syntax};
use pysrc_unparse::{PyVersion, UnparseOptions, unparse};
use unindent::unindent;

fn name(id: &str) -> Node {
    Node::new(Syntax::Name { id: id.to_owned() })
}

fn string(value: &str) -> Node {
    Node::new(Syntax::Str {
        value: value.to_owned(),
    })
}

fn stmt_at(value: Node, line: usize) -> Node {
    Node::at(
        Syntax::Expr {
            value: Box::new(value),
        },
        line,
    )
}

fn call(func: Node, args: Vec<Node>) -> Node {
    Node::new(Syntax::Call {
        func: Box::new(func),
        args,
        keywords: vec![],
        starargs: None,
        kwargs: None,
    })
}

#[test]
fn reconstructs_a_36_program_with_recorded_lines() {
    let send = call(
        name("send"),
        vec![Node::new(Syntax::JoinedStr {
            values: vec![
                string("hello "),
                Node::new(Syntax::FormattedValue {
                    value: Some(Box::new(name("name"))),
                }),
            ],
        })],
    );
    let guarded = Node::at(
        Syntax::Try {
            body: vec![stmt_at(
                Node::new(Syntax::Await {
                    value: Some(Box::new(send)),
                }),
                8,
            )],
            handlers: vec![Node::at(
                Syntax::ExceptHandler {
                    typ: Some(Box::new(name("ConnectionError"))),
                    name: Some(Box::new(name("err"))),
                    body: vec![Node::at(
                        Syntax::Raise {
                            exc: Some(Box::new(call(
                                name("RuntimeError"),
                                vec![string("send failed")],
                            ))),
                            cause: Some(Box::new(name("err"))),
                        },
                        10,
                    )],
                },
                9,
            )],
            orelse: vec![],
            finalbody: vec![stmt_at(call(name("log"), vec![string("done")]), 12)],
        },
        7,
    );
    let greet = Node::at(
        Syntax::AsyncFunctionDef {
            name: "greet".to_owned(),
            args: Signature {
                params: vec![
                    Node::new(Syntax::Param {
                        name: "self".to_owned(),
                        annotation: None,
                    }),
                    Node::new(Syntax::Param {
                        name: "name".to_owned(),
                        annotation: Some(Box::new(name("str"))),
                    }),
                ],
                ..Signature::default()
            },
            body: vec![guarded],
            decorators: vec![],
            returns: Some(Box::new(Node::new(Syntax::NameConstant {
                value: Singleton::None,
            }))),
        },
        6,
    );
    let tree = Node::new(Syntax::Module {
        body: vec![
            Node::at(
                Syntax::Import {
                    names: vec![Node::new(Syntax::Alias {
                        name: "asyncio".to_owned(),
                        asname: None,
                    })],
                },
                1,
            ),
            Node::at(
                Syntax::ClassDef {
                    name: "Greeter".to_owned(),
                    bases: vec![name("Base")],
                    keywords: vec![Node::new(Syntax::Keyword {
                        arg: Some("metaclass".to_owned()),
                        value: Box::new(name("Meta")),
                    })],
                    body: vec![stmt_at(string("Says hello."), 5), greet],
                    decorators: vec![Node::at(Syntax::Name { id: "register".to_owned() }, 3)],
                },
                4,
            ),
        ],
    });

    let out = unparse(&tree, PyVersion::Py36, &UnparseOptions::default()).unwrap();
    assert_eq!(
        out,
        unindent(
            r#"
            import asyncio

            @register
            class Greeter(Base, metaclass=Meta):
                """Says hello."""
                async def greet(self, name: str) -> None:
                    try:
                        await send(f'hello {name}')
                    except ConnectionError as err:
                        raise RuntimeError('send failed') from err
                    finally:
                        log('done')"#
        )
    );
}

#[test]
fn reconstructs_a_legacy_26_program() {
    let report = Node::at(
        Syntax::Print {
            dest: Some(Box::new(Node::new(Syntax::Attribute {
                value: Box::new(name("sys")),
                attr: "stderr".to_owned(),
            }))),
            values: vec![string("starting")],
            trailing_newline: false,
        },
        5,
    );
    let tree = Node::new(Syntax::Module {
        body: vec![
            Node::at(
                Syntax::Import {
                    names: vec![Node::new(Syntax::Alias {
                        name: "sys".to_owned(),
                        asname: None,
                    })],
                },
                1,
            ),
            Node::at(
                Syntax::FunctionDef {
                    name: "main".to_owned(),
                    args: Signature {
                        params: vec![Node::new(Syntax::Param {
                            name: "argv".to_owned(),
                            annotation: None,
                        })],
                        defaults: vec![name("None")],
                        vararg: None,
                        kwarg: None,
                    },
                    body: vec![
                        Node::at(
                            Syntax::TryFinally {
                                body: vec![report],
                                finalbody: vec![stmt_at(call(name("cleanup"), vec![]), 7)],
                            },
                            4,
                        ),
                        Node::at(
                            Syntax::Return {
                                value: Some(Box::new(Node::new(Syntax::Num {
                                    value: pysrc_unparse::ast::Number::Int(0),
                                }))),
                            },
                            8,
                        ),
                    ],
                    decorators: vec![],
                    returns: None,
                },
                3,
            ),
        ],
    });

    let out = unparse(&tree, PyVersion::Py26, &UnparseOptions::default()).unwrap();
    assert_eq!(
        out,
        unindent(
            "
            import sys

            def main(argv=None):
                try:
                    print >> sys.stderr, 'starting',
                finally:
                    cleanup()
                return 0"
        )
    );
}
