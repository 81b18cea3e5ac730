use arch::InstructionSet;
use wingc::frontend::definition::SignatureBuilder;
use wingc::frontend::types::Datatype;
use wingc::{run, BuiltIns, Compiler, CompilerConfig, Error, Rules};
use wingemu::{EmulatorError, DEFAULT_MAX_CYCLES};

fn compile_run(source: &str, max_cycles: u64) -> Result<Vec<u8>, Error> {
    let program = Compiler::default().compile_source(source)?;
    for (signature, addr) in program.functions.iter() {
        println!("[{:0>2X}] {}", addr, signature);
    }
    run(&program, max_cycles)
}

macro_rules! test_program {
    ($($name:ident: $source:expr => [$($out:expr),* $(,)?],)*) => {
        $(
            #[test]
            fn $name() {
                let output = compile_run($source, DEFAULT_MAX_CYCLES).unwrap();
                assert_eq!(output, vec![$($out as u8),*]);
            }
        )*
    };
}

macro_rules! test_error {
    ($($name:ident: $source:expr => $message:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let error = compile_run($source, DEFAULT_MAX_CYCLES).unwrap_err();
                println!("{error}");
                assert!(error.to_string().contains($message), "{error}");
            }
        )*
    };
}

test_program! {
    print_sum: "
        def main():
          print(5+10)
    " => [15],

    variables: "
        def main():
          val var:byte = 5
          val other = 10
          print(var)
          var = 3
          print(var)
          print(other)
    " => [5, 3, 10],

    fibonacci: "
        def main():
          val a:int = 1
          val b:int = 0
          val c:int = 0
          val counter:int = 0
          while bool(10-counter):
            print(a)
            c = a+b
            b = a
            a = c
            counter = counter+1
    " => [1, 1, 2, 3, 5, 8, 13, 21, 34, 55],

    nested_if: "
        def main():
          if 1 == 1:
            print(1)
            if 2 > 1:
              print(2)
            else:
              print(3)
          if 1 != 1:
            print(4)
    " => [1, 2],

    bool_variable: "
        def main():
          val small = 2 < 3
          if small:
            print(1)
          val zero = bool(0)
          if zero:
            print(9)
    " => [1],

    while_break: "
        def main():
          val i = 0
          while 1 == 1:
            if i == 3:
              break
            print(i)
            i = i + 1
          print(10)
    " => [0, 1, 2, 10],

    negative: "
        def main():
          val x = -3
          print(x + 5)
          print(7 - 10 + 4)
    " => [2, 1],

    call_with_arguments: "
        def test(a:int, b:int, c:int):
          print(a)
          print(b)
          print(c)

        def main():
          test(5, 10, 3)
    " => [5, 10, 3],

    call_order: "
        def first():
          print(5)

        def second(value:int):
          print(value)

        def main():
          first()
          second(1)
    " => [5, 1],

    call_locals_survive: "
        def show(value:int):
          val local = value + 2
          print(local)

        def main():
          val a = 5
          print(a)
          show(a)
          val b = 10
          print(b)
          show(a)
    " => [5, 7, 10, 7],

    return_value: "
        def five(): int
          return 5

        def inc(value:int): int
          result = value + 1

        def main():
          print(inc(five()))
          print(five())
    " => [6, 5],

    early_return: "
        def pick(flag:bool): int
          if flag:
            return 5
          return 6

        def main():
          print(pick(1 == 1))
          print(pick(1 == 0))
          return
          print(7)
    " => [5, 6],

    multiply: "
        def mul(a:int, b:int): int
          result = 0
          while bool(b):
            result = result + a
            b = b - 1

        def main():
          print(mul(0, 10))
          print(mul(4, 5))
          print(mul(10, 0))
    " => [0, 20, 0],

    recursion: "
        def count(n:int):
          if n == 0:
            return
          count(n - 1)
          print(n)

        def main():
          count(3)
    " => [1, 2, 3],

    instance_functions: "
        def (a:int) plus(b:int): int
          return a + b

        def main():
          val x = 5
          print(x.plus(6))
          print(x.plus(6).plus(7))
    " => [11, 18],

    structs: "
        struct point:
          x:int
          y:int

        def main():
          val p:point
          p.x = 2
          p.y = 5
          print(p.x)
          print(p.y)
    " => [2, 5],

    nested_structs: "
        struct inner:
          a:int
          b:int

        struct outer:
          first:int
          second:inner

        def main():
          val s:outer
          s.first = 1
          s.second.a = 2
          s.second.b = 3
          print(s.first)
          print(s.second.a)
          print(s.second.b)
    " => [1, 2, 3],

    struct_copy: "
        struct pair:
          a:int
          b:int

        def swap(p:pair): pair
          result.a = p.b
          result.b = p.a

        def main():
          val x:pair
          x.a = 1
          x.b = 2
          val y = swap(x)
          print(y.a)
          print(y.b)
          print(x.a)
    " => [2, 1, 1],

    struct_pointer: "
        struct point:
          x:int
          y:int

        def scale(p:*point):
          p->x = p->x + p->x
          p->y = p->y + p->y

        def main():
          val p:point
          p.x = 3
          p.y = 3
          scale(&p)
          print(p.x - 3)
          print(p.y + 0)
    " => [3, 6],

    pointers: "
        def set(target:*int, value:int):
          *target = value

        def main():
          val a = 5
          val b = 6
          val p = &a
          print(*p + 1)
          set(&b, 5)
          print(b)
    " => [6, 5],

    pointer_reassign: "
        def main():
          val a = 5
          val b = 10
          val p = &a
          print(*p)
          p = &b
          print(*p)
          *p = 6
          print(b)
          print(a)
    " => [5, 10, 6, 5],

    arrays: "
        def main():
          val arr = createArray(3)
          arr[0] = 5
          arr[1] = 10
          arr[2] = arr[0] + arr[1]
          print(arr.size())
          val i = 0
          while i != arr.size():
            print(arr[i])
            i = i + 1
    " => [3, 5, 10, 15],

    array_parameter: "
        def edit(arr:*int[]):
          arr[0] = 100

        def main():
          val arr = [1, 2, 3]
          edit(arr)
          print(arr[0])
          print(arr[2])
    " => [100, 3],

    strings: "
        def main():
          val a = \"abcd\"
          val b = createArray(a.size())
          val index = 0
          while index != a.size():
            val letter = a[index]
            letter = letter + 1
            b[index] = letter
            index = index + 1
          print(a)
          print(b)
    " => [b'a', b'b', b'c', b'd', b'b', b'c', b'd', b'e'],

    struct_through_pointer: "
        struct pair:
          a:int
          b:int

        def first(p:pair): int
          return p.a

        def main():
          val x:pair
          x.a = 3
          x.b = 4
          val p = &x
          val y:pair
          y = *p
          print(y.b)
          print(y.a)
          print(first(*p))
    " => [4, 3, 3],

    signed_comparison: "
        def main():
          if 5 < 200:
            print(1)
          if 0 < 1:
            print(2)
          if 100 > 200:
            print(3)
          if 200 < 5:
            print(4)
    " => [2, 4],

    read_global: "
        val i:int

        def main():
          print(i)
    " => [0],

    initialize_global: "
        val i=5

        def main():
          print(i)
    " => [5],

    global_initialize_call: "
        val i=callme()

        def callme():int
          result= 6

        def main():
          print(i)
    " => [6],

    global_struct: "
        struct pair:
          a:int
          b:int

        val origin:pair
        val count = 2

        def bump():
          count = count + 1

        def sum(p:pair): int
          return p.a + p.b

        def main():
          origin.a = 4
          origin.b = count
          bump()
          print(count)
          print(sum(origin))
          val at = &origin
          print(at->a)
    " => [3, 6, 4],

    local_shadows_global: "
        val x = 1

        def other():
          val x = 9
          print(x)

        def main():
          other()
          print(x)
    " => [9, 1],
}

test_error! {
    missing_main: "
        def test():
          print(1)
    " => "No main-function provided",

    unknown_variable: "
        def main():
          print(x)
    " => "Variable x not found",

    unknown_function: "
        def main():
          missing(1)
    " => "No function matches missing(int)",

    break_outside_loop: "
        def main():
          break
    " => "No loop to break from",

    int_condition: "
        def main():
          if 1:
            print(1)
    " => "Type of condition must be bool",

    assign_mismatch: "
        def main():
          val a = 1
          a = 1 == 1
    " => "Cannot assign bool",

    redeclare_other_type: "
        def main():
          val a = 1
          val a = 1 == 1
    " => "redeclared",

    allocation_in_argument: "
        def main():
          print(createArray(2).size())
    " => "can only be created as the value of an assignment",

    imports: "
        import other

        def main():
          print(1)
    " => "imports are not supported",

    no_field: "
        struct point:
          x:int

        def main():
          val p:point
          p.z = 1
    " => "has no field z",

    lambda_argument: "
        def hello():
          print(1)

        def main():
          run({hello()})
    " => "cannot be compiled for the emulator",

    unknown_in_global: "
        val i = missing

        def main():
          print(i)
    " => "Variable missing not found",
}

#[test]
fn lambdas_are_lifted() {
    let compiler = Compiler::default();
    let nodes = compiler
        .parse(
            "
        def main():
          run({hello()})
        ",
        )
        .unwrap();
    let lifted = wingc::frontend::lambda::extract_lambdas(&nodes);
    let declarations = compiler.declare(&lifted).unwrap();
    let names: Vec<&str> = declarations
        .sources
        .iter()
        .map(|(definition, _)| definition.name.as_str())
        .collect();
    assert_eq!(names, ["main", "lambda-main-0"]);
}

#[test]
fn assembled_builtin() {
    let mut builtins = BuiltIns::default();
    builtins.add_assembled(
        SignatureBuilder::new("double")
            .param("value", Datatype::Integer)
            .ret(Datatype::Integer)
            .build(),
        "
        LDA [FP #value]
        PUSHA
        POP ADDA
        STA [FP #result]
        RET
        ",
    );
    let compiler = Compiler::new(
        InstructionSet::standard(),
        Rules::default(),
        builtins,
        CompilerConfig::default(),
    );
    let program = compiler
        .compile_source(
            "
        def main():
          print(double(21))
        ",
        )
        .unwrap();
    assert!(program.entry_of("double(int):int").is_some());
    assert_eq!(run(&program, DEFAULT_MAX_CYCLES).unwrap(), vec![42]);
}

#[test]
fn cycle_limit() {
    let infinite = "
        def main():
          while 1 == 1:
            print(5)
    ";
    let error = compile_run(infinite, 100).unwrap_err();
    assert!(matches!(
        error,
        Error::Emulator(EmulatorError::CyclesExceeded)
    ));
}

#[test]
fn exact_cycle_count() {
    // LDFP, LDSP, CALL, LDA, out, RET, exit
    let source = "
        def main():
          print(5)
    ";
    assert_eq!(compile_run(source, 7).unwrap(), vec![5]);
    assert!(compile_run(source, 6).is_err());
}
